use ferrous_ioc::{
    ContainerBuilder, ContainerOptions, Definition, DependencyRequest, DiError, MapValueSource, PropertyValue,
    ValidationError, ValidationWarning,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Unit;

#[test]
fn test_valid_configuration_passes() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(Definition::factory("repo", || Ok(Unit)).capability("Repository").build())
        .unwrap();
    builder
        .register(Definition::constructor("service", [DependencyRequest::single("Repository")], |_| Ok(Unit)).build())
        .unwrap();

    let report = builder.validate();
    assert!(report.is_valid());
    assert!(!report.has_warnings());
    assert!(report.format_issues().is_empty());
}

#[test]
fn test_unsatisfied_and_ambiguous_are_reported() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(Definition::factory("sms", || Ok(Unit)).capability("Sender").build())
        .unwrap();
    builder
        .register(Definition::factory("email", || Ok(Unit)).capability("Sender").build())
        .unwrap();
    builder
        .register(
            Definition::constructor(
                "notifier",
                [DependencyRequest::single("Sender"), DependencyRequest::single("Clock")],
                |_| Ok(Unit),
            )
            .build(),
        )
        .unwrap();

    let report = builder.validate();
    assert_eq!(
        report.errors,
        [
            ValidationError::Ambiguous {
                component: "notifier".to_string(),
                request: "<Sender>".to_string(),
                candidates: vec!["sms".to_string(), "email".to_string()],
            },
            ValidationError::Unsatisfied {
                component: "notifier".to_string(),
                request: "<Clock>".to_string(),
            },
        ]
    );
}

#[test]
fn test_optional_and_collection_requests_never_fail() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::constructor(
                "consumer",
                [DependencyRequest::single("Cache").optional(), DependencyRequest::collection("Listener")],
                |_| Ok(Unit),
            )
            .build(),
        )
        .unwrap();

    assert!(builder.validate().is_valid());
}

#[test]
fn test_cycles_are_reported_without_building() {
    let built = Arc::new(AtomicUsize::new(0));
    let (b1, b2) = (built.clone(), built.clone());

    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::constructor("a", [DependencyRequest::single("B")], move |_| {
                b1.fetch_add(1, Ordering::SeqCst);
                Ok(Unit)
            })
            .capability("A")
            .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::factory("b", move || {
                b2.fetch_add(1, Ordering::SeqCst);
                Ok(Unit)
            })
            .capability("B")
            .property("a", DependencyRequest::single("A"), |_, _| Ok(()))
            .build(),
        )
        .unwrap();

    let report = builder.validate();
    assert_eq!(
        report.errors,
        [ValidationError::Cycle {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        }]
    );
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[test]
fn test_missing_external_values_are_reported() {
    let mut builder = ContainerBuilder::new();
    builder.value_source(MapValueSource::new().with("present", "1"));
    builder
        .register(
            Definition::factory("settings", || Ok(Unit))
                .property("a", PropertyValue::placeholder("${present}"), |_, _| Ok(()))
                .property("b", PropertyValue::placeholder("${absent:fallback}"), |_, _| Ok(()))
                .property("c", PropertyValue::placeholder("${absent}"), |_, _| Ok(()))
                .build(),
        )
        .unwrap();

    let report = builder.validate();
    assert_eq!(
        report.errors,
        [ValidationError::MissingExternalValue {
            component: "settings".to_string(),
            key: "absent".to_string(),
        }]
    );
    assert!(report.format_issues().contains("'settings' needs external value 'absent' which is not set"));
}

#[test]
fn test_singleton_depending_on_transient_warns() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(Definition::factory("prototype", || Ok(Unit)).capability("Proto").transient().build())
        .unwrap();
    builder
        .register(
            Definition::constructor(
                "holder",
                [DependencyRequest::single("Proto"), DependencyRequest::collection("Proto")],
                |_| Ok(Unit),
            )
            .build(),
        )
        .unwrap();

    let report = builder.validate();
    assert!(report.is_valid());
    assert_eq!(
        report.warnings,
        [ValidationWarning::SingletonDependsOnTransient {
            singleton: "holder".to_string(),
            transient: "prototype".to_string(),
        }]
    );
}

#[test]
fn test_validate_on_build_rejects_invalid_configuration() {
    let mut builder = ContainerBuilder::new();
    builder.options(ContainerOptions::default().validate_on_build(true));
    builder
        .register(Definition::constructor("lonely", [DependencyRequest::single("Friend")], |_| Ok(Unit)).build())
        .unwrap();

    match builder.build() {
        Err(DiError::Unsatisfied { request, site }) => {
            assert_eq!(request, "<Friend>");
            assert_eq!(site, "'lonely'");
        }
        other => panic!("expected Unsatisfied, got {:?}", other),
    }
}

#[test]
fn test_invalid_configuration_builds_lazily_without_validation() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(Definition::constructor("lonely", [DependencyRequest::single("Friend")], |_| Ok(Unit)).build())
        .unwrap();

    let container = builder.build().unwrap();
    assert!(matches!(container.get("lonely").unwrap_err().root(), DiError::Unsatisfied { .. }));
}
