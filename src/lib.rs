//! # ferrous-ioc
//!
//! A managed-component container: named definitions, capability-based
//! dependency resolution, singleton and transient scopes, and ordered
//! lifecycle hooks.
//!
//! ## Features
//!
//! - **Named definitions**: every component has a unique name plus optional aliases
//! - **Capability resolution**: single, qualified, optional, and collection requests
//! - **Primary markers**: break ties among several implementors of a capability
//! - **Scopes**: container-owned singletons and per-request transients
//! - **Lifecycle**: init hooks for every scope, destroy hooks for singletons in reverse construction order
//! - **Circular dependency detection**: construction-stack based, with the full path in the error
//! - **External values**: `${key:default}` placeholders backed by pluggable value sources
//! - **Thread-safe**: concurrent first requests build a singleton exactly once
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{ContainerBuilder, Definition, DependencyRequest};
//! use std::sync::Arc;
//!
//! trait MovieFinder: Send + Sync {
//!     fn find_all(&self) -> Vec<String>;
//! }
//!
//! struct StaticFinder;
//! impl MovieFinder for StaticFinder {
//!     fn find_all(&self) -> Vec<String> {
//!         vec!["Alien".into(), "Heat".into()]
//!     }
//! }
//!
//! struct MovieLister {
//!     finder: Arc<dyn MovieFinder>,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.register(
//!     Definition::factory("staticFinder", || Ok(StaticFinder))
//!         .capability("MovieFinder")
//!         .view::<dyn MovieFinder>(|f| f as Arc<dyn MovieFinder>)
//!         .build(),
//! ).unwrap();
//! builder.register(
//!     Definition::constructor("movieLister", [DependencyRequest::single("MovieFinder")], |args| {
//!         Ok(MovieLister { finder: args.view::<dyn MovieFinder>(0)? })
//!     })
//!     .build(),
//! ).unwrap();
//!
//! let container = builder.build().unwrap();
//! let lister = container.get_as::<MovieLister>("movieLister").unwrap();
//! assert_eq!(lister.finder.find_all().len(), 2);
//! container.shutdown().unwrap();
//! ```
//!
//! ## Scopes
//!
//! - **Singleton**: created once, cached, destroyed at [`Container::shutdown`]
//! - **Transient**: created fresh on every request; the container keeps no reference
//!
//! A singleton that depends on a transient keeps the one instance it was
//! built with.
//!
//! ## Resolution Rules
//!
//! A [`DependencyRequest`] names a [`Capability`]. Collection requests take
//! every candidate in registration order. Single requests take the candidate
//! named by the qualifier, else the only candidate, else the unique primary
//! candidate; anything else is [`DiError::Unsatisfied`] (or absent, for
//! optional requests) or [`DiError::Ambiguous`].

// Module declarations
pub mod collection;
pub mod config;
pub mod definition;
pub mod descriptors;
pub mod error;
pub mod instance;
pub mod key;
pub mod lifecycle;
pub mod observer;
pub mod provider;
pub mod registry;
pub mod request;
pub mod scope;
pub mod traits;
pub mod validation;

// Internal modules
mod internal;

// Re-exports
pub use collection::ContainerBuilder;
pub use config::{ChainedValueSource, ContainerOptions, EnvValueSource, MapValueSource, ValueSource};
pub use definition::{Definition, DefinitionBuilder, PropertyValue};
pub use descriptors::DefinitionDescriptor;
pub use error::{BoxError, DestroyFailure, DiError, DiResult};
pub use instance::{Args, Components, Instance, Resolved};
pub use key::Capability;
pub use lifecycle::{LifecycleState, PostProcessor};
pub use observer::{ContainerObserver, MetricsObserver, TracingObserver};
pub use provider::Container;
pub use registry::DefinitionRegistry;
pub use request::{DependencyRequest, Multiplicity};
pub use scope::Scope;
pub use traits::{Dispose, Initialize};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_singleton_resolution() {
        let mut builder = ContainerBuilder::new();
        builder.register(Definition::factory("answer", || Ok(42usize)).build()).unwrap();

        let container = builder.build().unwrap();
        let a = container.get_as::<usize>("answer").unwrap();
        let b = container.get_as::<usize>("answer").unwrap();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_resolution() {
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let mut builder = ContainerBuilder::new();
        builder
            .register(
                Definition::factory("label", move || {
                    let mut c = counter_clone.lock();
                    *c += 1;
                    Ok(format!("instance-{}", *c))
                })
                .transient()
                .build(),
            )
            .unwrap();

        let container = builder.build().unwrap();
        let a = container.get_as::<String>("label").unwrap();
        let b = container.get_as::<String>("label").unwrap();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_alias_resolves_same_singleton() {
        let mut builder = ContainerBuilder::new();
        builder
            .register(Definition::factory("primaryName", || Ok(7u8)).alias("nickname").build())
            .unwrap();

        let container = builder.build().unwrap();
        let by_name = container.get("primaryName").unwrap();
        let by_alias = container.get("nickname").unwrap();
        assert!(by_name.ptr_eq(&by_alias));
        assert_eq!(by_alias.name(), "primaryName");
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let mut builder = ContainerBuilder::new();
        builder.register(Definition::factory("number", || Ok(1u32)).build()).unwrap();

        let container = builder.build().unwrap();
        let err = container.get_as::<String>("number").unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_trait_view_declared_with_turbofish() {
        trait Shape: Send + Sync {
            fn sides(&self) -> usize;
        }
        struct Square;
        impl Shape for Square {
            fn sides(&self) -> usize {
                4
            }
        }

        let mut builder = ContainerBuilder::new();
        builder
            .register(
                Definition::factory("square", || Ok(Square))
                    .view::<dyn Shape>(|s| s as Arc<dyn Shape>)
                    .build(),
            )
            .unwrap();

        let container = builder.build().unwrap();
        let shape = container.get_view::<dyn Shape>("square").unwrap();
        assert_eq!(shape.sides(), 4);
        assert!(container.get("square").unwrap().view::<dyn Shape>().is_some());
    }
}
