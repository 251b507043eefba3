//! Container builder module.
//!
//! This module contains the [`ContainerBuilder`] type used to register
//! definitions, value sources, post-processors, and observers before building
//! a [`Container`].

use std::sync::Arc;

use crate::config::{ContainerOptions, MapValueSource, ValueSource};
use crate::definition::Definition;
use crate::descriptors::DefinitionDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::ConstructionStack;
use crate::lifecycle::PostProcessor;
use crate::observer::{ContainerObserver, Observers};
use crate::provider::Container;
use crate::registry::DefinitionRegistry;
use crate::scope::Scope;
use crate::validation::{self, ValidationReport};

/// Collects definitions and container-wide hooks, then builds a [`Container`].
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerBuilder, ContainerOptions, Definition, MapValueSource, PropertyValue};
///
/// struct Server {
///     port: u16,
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .value_source(MapValueSource::new().with("server.port", "9090"))
///     .options(ContainerOptions::default().eager_singletons(true));
/// builder.register(
///     Definition::factory("server", || Ok(Server { port: 0 }))
///         .property("port", PropertyValue::placeholder("${server.port:8080}"), |s, v| {
///             s.port = v.parse()?;
///             Ok(())
///         })
///         .build(),
/// ).unwrap();
///
/// let container = builder.build().unwrap();
/// assert_eq!(container.get_as::<Server>("server").unwrap().port, 9090);
/// container.shutdown().unwrap();
/// ```
pub struct ContainerBuilder {
    registry: DefinitionRegistry,
    values: Arc<dyn ValueSource>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    observers: Observers,
    options: ContainerOptions,
}

impl ContainerBuilder {
    /// Creates an empty builder with no external values and default options.
    pub fn new() -> Self {
        Self {
            registry: DefinitionRegistry::new(),
            values: Arc::new(MapValueSource::new()),
            post_processors: Vec::new(),
            observers: Observers::new(),
            options: ContainerOptions::default(),
        }
    }

    /// Registers a definition.
    ///
    /// # Errors
    ///
    /// [`DiError::DuplicateName`] when the name or an alias is already taken;
    /// the builder is unchanged.
    pub fn register(&mut self, definition: Definition) -> DiResult<&mut Self> {
        self.registry.register(definition)?;
        Ok(self)
    }

    /// Registers several definitions, stopping at the first failure.
    pub fn register_all(&mut self, definitions: impl IntoIterator<Item = Definition>) -> DiResult<&mut Self> {
        for definition in definitions {
            self.registry.register(definition)?;
        }
        Ok(self)
    }

    /// Sets the source of `${key:default}` values.
    pub fn value_source(&mut self, source: impl ValueSource + 'static) -> &mut Self {
        self.values = Arc::new(source);
        self
    }

    /// Sets a shared source of `${key:default}` values.
    pub fn shared_value_source(&mut self, source: Arc<dyn ValueSource>) -> &mut Self {
        self.values = source;
        self
    }

    /// Adds a post-processor applied to every component, in registration order.
    pub fn add_post_processor(&mut self, processor: Arc<dyn PostProcessor>) -> &mut Self {
        self.post_processors.push(processor);
        self
    }

    /// Adds a lifecycle observer.
    pub fn add_observer(&mut self, observer: Arc<dyn ContainerObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Replaces the container options.
    pub fn options(&mut self, options: ContainerOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Whether `name` is a registered name or alias.
    pub fn contains_definition(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Registered definitions
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Snapshots of every registered definition, in registration order.
    pub fn descriptors(&self) -> Vec<DefinitionDescriptor> {
        self.registry.iter().map(|d| DefinitionDescriptor::from(&**d)).collect()
    }

    /// Checks every dependency and external value without building anything.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_ioc::{ContainerBuilder, Definition, DependencyRequest, ValidationError};
    ///
    /// struct A;
    /// let mut builder = ContainerBuilder::new();
    /// builder.register(
    ///     Definition::constructor("a", [DependencyRequest::single("Missing")], |_| Ok(A)).build(),
    /// ).unwrap();
    ///
    /// let report = builder.validate();
    /// assert!(!report.is_valid());
    /// assert!(matches!(&report.errors[0], ValidationError::Unsatisfied { component, .. } if component == "a"));
    /// ```
    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.registry, &self.values)
    }

    /// Builds the container.
    ///
    /// With [`ContainerOptions::validate_on_build`], the first validation
    /// error fails the build. With [`ContainerOptions::eager_singletons`],
    /// every non-lazy singleton is created in registration order; on the first
    /// failure the singletons created so far are destroyed and the error is
    /// returned.
    pub fn build(self) -> DiResult<Container> {
        if self.options.validates_on_build() {
            let report = self.validate();
            for warning in &report.warnings {
                tracing::warn!(%warning, "container validation warning");
            }
            if let Some(error) = report.errors.into_iter().next() {
                return Err(DiError::from(error));
            }
        }

        let eager = self.options.is_eager();
        tracing::debug!(definitions = self.registry.len(), eager, "building container");
        let container = Container::new(
            self.registry,
            self.values,
            self.post_processors,
            self.observers,
            self.options,
        );

        if eager {
            Self::instantiate_singletons(&container)?;
        }
        Ok(container)
    }

    fn instantiate_singletons(container: &Container) -> DiResult<()> {
        let inner = container.inner();
        for (slot, definition) in inner.registry.iter().enumerate() {
            if definition.scope() != Scope::Singleton || definition.is_lazy() {
                continue;
            }
            let mut stack = ConstructionStack::new(inner.options.max_depth_limit());
            if let Err(err) = inner.instance_for(slot, &mut stack) {
                tracing::warn!(name = definition.name(), error = %err, "eager singleton creation failed");
                if let Err(cleanup) = container.shutdown() {
                    tracing::warn!(error = %cleanup, "cleanup after failed startup reported errors");
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
