/// Full application integration test
///
/// Wires a small movie catalogue and notification service the way an
/// application would: trait views, capability autowiring with primaries and
/// qualifiers, collection injection, external values, a post-processor,
/// observers, and an orderly shutdown.

use ferrous_ioc::{
    Args, BoxError, Components, ContainerBuilder, ContainerOptions, Definition, DependencyRequest, DiResult,
    Dispose, Initialize, MapValueSource, MetricsObserver, PostProcessor, PropertyValue, TracingObserver,
};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ===== Domain =====

pub trait MovieFinder: Send + Sync {
    fn find_all(&self) -> Vec<Movie>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub title: String,
    pub director: String,
}

pub struct CsvMovieFinder {
    file: String,
    rows: Vec<Movie>,
}

impl Initialize for CsvMovieFinder {
    fn after_properties_set(&mut self) -> Result<(), BoxError> {
        if self.file.is_empty() {
            return Err("no movie file configured".into());
        }
        self.rows = vec![
            Movie { title: "Alien".into(), director: "Ridley Scott".into() },
            Movie { title: "Blade Runner".into(), director: "Ridley Scott".into() },
            Movie { title: "Heat".into(), director: "Michael Mann".into() },
        ];
        Ok(())
    }
}

impl MovieFinder for CsvMovieFinder {
    fn find_all(&self) -> Vec<Movie> {
        self.rows.clone()
    }
}

pub struct StubMovieFinder;

impl MovieFinder for StubMovieFinder {
    fn find_all(&self) -> Vec<Movie> {
        vec![Movie { title: "Stub".into(), director: "Nobody".into() }]
    }
}

pub struct MovieLister {
    finder: Arc<dyn MovieFinder>,
}

impl MovieLister {
    pub fn movies_directed_by(&self, director: &str) -> Vec<String> {
        self.finder
            .find_all()
            .into_iter()
            .filter(|m| m.director == director)
            .map(|m| m.title)
            .collect()
    }
}

pub trait MessageSender: Send + Sync {
    fn send(&self, to: &str, body: &str) -> String;
}

pub struct SmsSender;
impl MessageSender for SmsSender {
    fn send(&self, to: &str, body: &str) -> String {
        format!("sms to {}: {}", to, body)
    }
}

pub struct EmailSender {
    from: String,
}
impl MessageSender for EmailSender {
    fn send(&self, to: &str, body: &str) -> String {
        format!("email from {} to {}: {}", self.from, to, body)
    }
}

pub struct MessageService {
    senders: Components,
    default_sender: Arc<dyn MessageSender>,
    audit: Option<Arc<AuditLog>>,
}

impl MessageService {
    pub fn broadcast(&self, to: &str, body: &str) -> DiResult<Vec<(String, String)>> {
        let views = self.senders.views::<dyn MessageSender>()?;
        Ok(views.into_iter().map(|(name, s)| (name, s.send(to, body))).collect())
    }

    pub fn send(&self, to: &str, body: &str) -> String {
        let sent = self.default_sender.send(to, body);
        if let Some(audit) = &self.audit {
            audit.record(&sent);
        }
        sent
    }
}

#[derive(Default)]
pub struct AuditLog {
    entries: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl AuditLog {
    fn record(&self, entry: &str) {
        self.entries.lock().unwrap().push(entry.to_string());
    }
}

impl Dispose for AuditLog {
    fn dispose(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Records the order in which components finish initialization.
struct InitOrder(Arc<Mutex<Vec<String>>>);

impl PostProcessor for InitOrder {
    fn after_init(&self, name: &str, _component: &mut (dyn Any + Send + Sync)) -> Result<(), BoxError> {
        self.0.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

fn message_service(args: &Args<'_>) -> Result<MessageService, BoxError> {
    Ok(MessageService {
        senders: args.components(0)?,
        default_sender: args.view::<dyn MessageSender>(1)?,
        audit: args.optional::<AuditLog>(2)?,
    })
}

fn application(eager: bool, audit: bool) -> (ContainerBuilder, Arc<Mutex<Vec<String>>>, Arc<MetricsObserver>) {
    let order = Arc::new(Mutex::new(Vec::new()));
    let metrics = Arc::new(MetricsObserver::new());

    let mut builder = ContainerBuilder::new();
    builder
        .value_source(MapValueSource::new().with("movies.file", "movies.csv"))
        .options(ContainerOptions::default().eager_singletons(eager))
        .add_post_processor(Arc::new(InitOrder(order.clone())))
        .add_observer(metrics.clone())
        .add_observer(Arc::new(TracingObserver::with_label("app")));

    builder
        .register(
            Definition::factory("csvFinder", || Ok(CsvMovieFinder { file: String::new(), rows: Vec::new() }))
                .capability("MovieFinder")
                .primary()
                .property("file", PropertyValue::placeholder("${movies.file}"), |f, v| {
                    f.file = v.into_text()?;
                    Ok(())
                })
                .initializing()
                .view::<dyn MovieFinder>(|f| f as Arc<dyn MovieFinder>)
                .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::factory("stubFinder", || Ok(StubMovieFinder))
                .capability("MovieFinder")
                .lazy()
                .view::<dyn MovieFinder>(|f| f as Arc<dyn MovieFinder>)
                .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::constructor("movieLister", [DependencyRequest::single("MovieFinder")], |args| {
                Ok(MovieLister {
                    finder: args.view::<dyn MovieFinder>(0)?,
                })
            })
            .alias("lister")
            .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::constructor("testLister", [DependencyRequest::single("MovieFinder").qualified("stubFinder")], |args| {
                Ok(MovieLister {
                    finder: args.view::<dyn MovieFinder>(0)?,
                })
            })
            .transient()
            .build(),
        )
        .unwrap();

    builder
        .register(
            Definition::factory("sms", || Ok(SmsSender))
                .capability("MessageSender")
                .view::<dyn MessageSender>(|s| s as Arc<dyn MessageSender>)
                .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::factory("email", || Ok(EmailSender { from: String::new() }))
                .capability("MessageSender")
                .alias("mail")
                .property("from", PropertyValue::placeholder("${mail.from:noreply@example.com}"), |e, v| {
                    e.from = v.into_text()?;
                    Ok(())
                })
                .view::<dyn MessageSender>(|s| s as Arc<dyn MessageSender>)
                .build(),
        )
        .unwrap();
    if audit {
        builder
            .register(Definition::factory("auditLog", || Ok(AuditLog::default())).capability("AuditLog").disposable().build())
            .unwrap();
    }
    builder
        .register(
            Definition::constructor(
                "messageService",
                [
                    DependencyRequest::collection("MessageSender"),
                    DependencyRequest::single("MessageSender").qualified("mail"),
                    DependencyRequest::single("AuditLog").optional(),
                ],
                message_service,
            )
            .build(),
        )
        .unwrap();

    (builder, order, metrics)
}

#[test]
fn test_movie_lister_uses_primary_finder() {
    let (builder, _, _) = application(false, false);
    let container = builder.build().unwrap();

    let lister = container.get_as::<MovieLister>("lister").unwrap();
    assert_eq!(lister.movies_directed_by("Ridley Scott"), ["Alien", "Blade Runner"]);

    let test_lister = container.get_as::<MovieLister>("testLister").unwrap();
    assert_eq!(test_lister.movies_directed_by("Nobody"), ["Stub"]);

    container.shutdown().unwrap();
}

#[test]
fn test_message_service_wiring() {
    let (builder, _, _) = application(false, true);
    let container = builder.build().unwrap();

    let service = container.get_as::<MessageService>("messageService").unwrap();
    let sent = service.broadcast("ann", "hi").unwrap();
    assert_eq!(
        sent,
        [
            ("sms".to_string(), "sms to ann: hi".to_string()),
            ("email".to_string(), "email from noreply@example.com to ann: hi".to_string()),
        ]
    );
    assert_eq!(service.send("bob", "yo"), "email from noreply@example.com to bob: yo");

    let audit = container.get_as::<AuditLog>("auditLog").unwrap();
    assert_eq!(*audit.entries.lock().unwrap(), ["email from noreply@example.com to bob: yo"]);

    container.shutdown().unwrap();
    assert!(audit.closed.load(Ordering::SeqCst));
}

#[test]
fn test_missing_optional_audit_log() {
    let (builder, _, _) = application(false, false);
    let container = builder.build().unwrap();

    let service = container.get_as::<MessageService>("messageService").unwrap();
    assert!(service.audit.is_none());
}

#[test]
fn test_eager_startup_follows_registration_order() {
    let (builder, order, metrics) = application(true, true);
    let container = builder.build().unwrap();

    // stubFinder is lazy and testLister is transient
    assert_eq!(
        *order.lock().unwrap(),
        ["csvFinder", "movieLister", "sms", "email", "auditLog", "messageService"]
    );
    assert_eq!(metrics.created_count(), 6);
    assert_eq!(metrics.failed_count(), 0);

    container.shutdown().unwrap();
    assert_eq!(metrics.destroyed_count(), 6);
}

#[test]
fn test_initializer_failure_surfaces_through_dependents() {
    let (mut builder, _, metrics) = application(false, false);
    builder.value_source(MapValueSource::new().with("movies.file", ""));
    let container = builder.build().unwrap();

    let err = container.get("movieLister").unwrap_err();
    assert_eq!(err.creation_path(), ["movieLister", "csvFinder"]);
    assert!(err.to_string().contains("no movie file configured"));
    assert_eq!(metrics.failed_count(), 2);
}
