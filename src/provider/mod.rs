//! Container module: resolving and owning managed components.
//!
//! This module contains the [`Container`] type produced by
//! [`ContainerBuilder::build`](crate::ContainerBuilder::build).

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::config::{ContainerOptions, ValueSource};
use crate::definition::Definition;
use crate::descriptors::DefinitionDescriptor;
use crate::error::{DiError, DiResult};
use crate::instance::{Components, Instance, Resolved};
use crate::internal::ConstructionStack;
use crate::key::Capability;
use crate::lifecycle::{LifecycleState, PostProcessor};
use crate::observer::Observers;
use crate::registry::DefinitionRegistry;
use crate::request::DependencyRequest;
use crate::scope::Scope;

mod graph;
pub(crate) mod resolver;
mod scope;

use scope::SingletonScope;

/// The managed-component container.
///
/// Resolves components by name or capability according to their scope and
/// owns every singleton it creates until [`shutdown`](Self::shutdown).
///
/// # Thread Safety
///
/// `Container` is `Send + Sync` and cheap to clone (it uses `Arc`
/// internally). Concurrent first requests for the same singleton construct it
/// exactly once.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ContainerBuilder, Definition, DependencyRequest};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(
///     Definition::factory("database", || Ok(Database { url: "postgres://localhost".to_string() }))
///         .capability("Database")
///         .build(),
/// ).unwrap();
/// builder.register(
///     Definition::constructor("userService", [DependencyRequest::single("Database")], |args| {
///         Ok(UserService { db: args.arc::<Database>(0)? })
///     })
///     .transient()
///     .build(),
/// ).unwrap();
///
/// let container = builder.build().unwrap();
/// let users = container.get_as::<UserService>("userService").unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// container.shutdown().unwrap();
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) registry: DefinitionRegistry,
    pub(crate) values: Arc<dyn ValueSource>,
    pub(crate) post_processors: Vec<Arc<dyn PostProcessor>>,
    pub(crate) observers: Observers,
    pub(crate) options: ContainerOptions,
    singletons: SingletonScope,
}

impl Container {
    pub(crate) fn new(
        registry: DefinitionRegistry,
        values: Arc<dyn ValueSource>,
        post_processors: Vec<Arc<dyn PostProcessor>>,
        observers: Observers,
        options: ContainerOptions,
    ) -> Self {
        let singletons = SingletonScope::new(registry.len());
        Self {
            inner: Arc::new(ContainerInner {
                registry,
                values,
                post_processors,
                observers,
                options,
                singletons,
            }),
        }
    }

    fn stack(&self) -> ConstructionStack {
        ConstructionStack::new(self.inner.options.max_depth_limit())
    }

    fn ensure_open(&self) -> DiResult<()> {
        if self.inner.singletons.is_closed() {
            Err(DiError::ContainerClosed)
        } else {
            Ok(())
        }
    }

    /// Component registered under `name` or an alias of it.
    ///
    /// # Errors
    ///
    /// [`DiError::NotFound`] for unknown names; any construction error,
    /// wrapped in [`DiError::Creating`] layers for the components whose
    /// dependencies failed.
    pub fn get(&self, name: &str) -> DiResult<Instance> {
        self.ensure_open()?;
        let slot = self
            .inner
            .registry
            .slot_of(name)
            .ok_or_else(|| DiError::NotFound(name.to_string()))?;
        self.inner.instance_for(slot, &mut self.stack())
    }

    /// Component `name` downcast to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        self.get(name).and_then(|instance| Resolved::Instance(instance).into_arc::<T>())
    }

    /// Component `name` through the view `V`.
    pub fn get_view<V: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<V>> {
        self.get(name).and_then(|instance| Resolved::Instance(instance).into_view::<V>())
    }

    /// The single component satisfying `capability`, narrowed by `qualifier`
    /// when given.
    ///
    /// Uses the same rules as dependency resolution: a qualifier selects the
    /// candidate with that name or alias, several candidates need exactly one
    /// primary.
    pub fn get_by_capability(&self, capability: impl Into<Capability>, qualifier: Option<&str>) -> DiResult<Instance> {
        self.ensure_open()?;
        let mut request = DependencyRequest::single(capability);
        if let Some(qualifier) = qualifier {
            request = request.qualified(qualifier);
        }
        match self.inner.resolve(&request, "container lookup", &mut self.stack())? {
            Resolved::Instance(instance) => Ok(instance),
            other => Err(DiError::TypeMismatch {
                expected: type_name::<Instance>(),
                site: format!("lookup of {} returned {:?}", request, other),
            }),
        }
    }

    /// Every component satisfying `capability`, keyed by definition name in
    /// registration order. Empty when nothing matches.
    pub fn get_all(&self, capability: impl Into<Capability>) -> DiResult<Components> {
        self.ensure_open()?;
        let request = DependencyRequest::collection(capability);
        self.inner
            .resolve(&request, "container lookup", &mut self.stack())?
            .into_components()
    }

    /// Whether `name` is a registered name or alias.
    pub fn contains_definition(&self, name: &str) -> bool {
        self.inner.registry.contains(name)
    }

    /// Definition registered under `name` or an alias of it.
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.inner.registry.lookup_by_name(name).ok().map(|d| &**d)
    }

    /// Registered names in registration order
    pub fn definition_names(&self) -> Vec<&str> {
        self.inner.registry.names().collect()
    }

    /// Snapshots of every registered definition
    pub fn descriptors(&self) -> Vec<DefinitionDescriptor> {
        self.inner.registry.iter().map(|d| DefinitionDescriptor::from(&**d)).collect()
    }

    /// Lifecycle state of singleton `name`; `None` for transients and for
    /// singletons not created yet.
    pub fn lifecycle_state(&self, name: &str) -> Option<LifecycleState> {
        let slot = self.inner.registry.slot_of(name)?;
        match self.inner.registry.at(slot).scope() {
            Scope::Singleton => self.inner.singletons.state(slot),
            Scope::Transient => None,
        }
    }

    /// Options the container was built with
    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Runs every singleton's destroy hooks in reverse construction order.
    ///
    /// Every hook runs even if an earlier one fails; failures are returned
    /// together as [`DiError::Shutdown`]. Idempotent: later calls do nothing
    /// and return `Ok`. Afterwards every `get*` fails with
    /// [`DiError::ContainerClosed`]. Transients are never destroyed.
    pub fn shutdown(&self) -> DiResult<()> {
        let registry = &self.inner.registry;
        self.inner
            .singletons
            .shutdown(|name| registry.slot_of(name), &self.inner.observers)
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.inner.singletons.is_closed()
    }

    pub(crate) fn inner(&self) -> &ContainerInner {
        &self.inner
    }

    /// Human-readable dump of definitions and singleton states.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        for definition in self.inner.registry.iter() {
            let state = self
                .lifecycle_state(definition.name())
                .map(|state| state.to_string())
                .unwrap_or_else(|| "-".to_string());
            s.push_str(&format!(
                "  {} ({:?}, {}) capabilities={:?} state={}\n",
                definition.name(),
                definition.scope(),
                definition.type_name(),
                definition.capabilities().iter().map(Capability::as_str).collect::<Vec<_>>(),
                state,
            ));
        }
        s
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.inner.registry.len())
            .field("live_singletons", &self.inner.singletons.live_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        // Last handle: warn about singletons that never saw their destroy hooks
        if Arc::strong_count(&self.inner) == 1
            && !self.inner.singletons.is_closed()
            && self.inner.singletons.live_count() > 0
        {
            tracing::warn!(
                live = self.inner.singletons.live_count(),
                "Container dropped without shutdown; destroy hooks were not run"
            );
        }
    }
}
