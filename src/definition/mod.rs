//! Component definitions: how to build, wire, and tear down one component.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{BoxError, DiError};
use crate::instance::{AnyArc, AnyBox, Args, Resolved};
use crate::key::Capability;
use crate::request::DependencyRequest;
use crate::scope::Scope;
use crate::traits::{Dispose, Initialize};

mod property;

pub use property::PropertyValue;

type AnyMut = dyn Any + Send + Sync;

pub(crate) type CreateFn = Arc<dyn Fn(&Args<'_>) -> Result<AnyBox, BoxError> + Send + Sync>;
pub(crate) type AssignFn = Arc<dyn Fn(&mut AnyMut, Resolved) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type InitFn = Arc<dyn Fn(&mut AnyMut) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type DestroyFn = Arc<dyn Fn(&AnyMut) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type ViewFn = Arc<dyn Fn(&AnyArc) -> Option<AnyBox> + Send + Sync>;

/// A property assigned after construction.
#[derive(Clone)]
pub(crate) struct PropertyBinding {
    pub(crate) name: String,
    pub(crate) value: PropertyValue,
    pub(crate) assign: AssignFn,
}

/// Recipe for one managed component.
///
/// Created through [`Definition::constructor`] or [`Definition::factory`] and
/// registered with [`ContainerBuilder::register`](crate::ContainerBuilder::register).
/// Immutable once built.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Definition, DependencyRequest, PropertyValue, Scope};
///
/// struct Finder;
/// struct Lister {
///     finder: std::sync::Arc<Finder>,
///     title: String,
/// }
///
/// let lister = Definition::constructor(
///     "movieLister",
///     [DependencyRequest::single("MovieFinder")],
///     |args| Ok(Lister { finder: args.arc::<Finder>(0)?, title: String::new() }),
/// )
/// .capability("MovieLister")
/// .alias("lister")
/// .property("title", PropertyValue::placeholder("${lister.title:Movies}"), |lister, value| {
///     lister.title = value.into_text()?;
///     Ok(())
/// })
/// .build();
///
/// assert_eq!(lister.name(), "movieLister");
/// assert_eq!(lister.aliases(), ["lister".to_string()]);
/// assert_eq!(lister.scope(), Scope::Singleton);
/// assert_eq!(lister.dependencies().len(), 1);
/// ```
pub struct Definition {
    name: String,
    aliases: Vec<String>,
    capabilities: Vec<Capability>,
    dependencies: Vec<DependencyRequest>,
    properties: Vec<PropertyBinding>,
    scope: Scope,
    primary: bool,
    lazy: bool,
    type_name: &'static str,
    create: CreateFn,
    init_hooks: Vec<InitFn>,
    destroy_hooks: Vec<DestroyFn>,
    views: Vec<(TypeId, ViewFn)>,
}

impl Definition {
    /// Starts a definition whose constructor receives resolved `dependencies`
    /// in declaration order.
    pub fn constructor<T, F>(
        name: impl Into<String>,
        dependencies: impl IntoIterator<Item = DependencyRequest>,
        constructor: F,
    ) -> DefinitionBuilder<T>
    where
        T: Any + Send + Sync,
        F: Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let create: CreateFn = Arc::new(move |args: &Args<'_>| {
            constructor(args).map(|value| Box::new(value) as AnyBox)
        });
        DefinitionBuilder::new(name.into(), dependencies.into_iter().collect(), create)
    }

    /// Starts a definition built by a zero-argument factory.
    pub fn factory<T, F>(name: impl Into<String>, factory: F) -> DefinitionBuilder<T>
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::constructor(name, std::iter::empty(), move |_| factory())
    }

    /// Unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative names resolving to this definition
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Capability tags this definition satisfies
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Whether this definition satisfies `capability`
    pub fn satisfies(&self, capability: &Capability) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether `name` is this definition's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Constructor dependencies in declaration order
    pub fn dependencies(&self) -> &[DependencyRequest] {
        &self.dependencies
    }

    /// Property names and values in assignment order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|p| (p.name.as_str(), &p.value))
    }

    /// Every dependency request: constructor dependencies, then property dependencies.
    pub fn all_dependencies(&self) -> impl Iterator<Item = &DependencyRequest> {
        self.dependencies.iter().chain(self.properties.iter().filter_map(|p| match &p.value {
            PropertyValue::Dependency(request) => Some(request),
            _ => None,
        }))
    }

    /// Instance reuse policy
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether this definition wins single-instance ambiguity among its peers
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Whether eager startup skips this singleton
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Rust type produced by the constructor
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether any init hook is declared
    pub fn has_init_hook(&self) -> bool {
        !self.init_hooks.is_empty()
    }

    /// Whether any destroy hook is declared
    pub fn has_destroy_hook(&self) -> bool {
        !self.destroy_hooks.is_empty()
    }

    pub(crate) fn create(&self, args: &Args<'_>) -> Result<AnyBox, BoxError> {
        (self.create)(args)
    }

    pub(crate) fn property_bindings(&self) -> &[PropertyBinding] {
        &self.properties
    }

    pub(crate) fn init_hooks(&self) -> &[InitFn] {
        &self.init_hooks
    }

    pub(crate) fn destroy_hooks(&self) -> &[DestroyFn] {
        &self.destroy_hooks
    }

    pub(crate) fn view_for(&self, id: TypeId) -> Option<&ViewFn> {
        self.views.iter().find(|(view, _)| *view == id).map(|(_, f)| f)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("capabilities", &self.capabilities)
            .field("dependencies", &self.dependencies)
            .field("properties", &self.properties.iter().map(|p| &p.name).collect::<Vec<_>>())
            .field("scope", &self.scope)
            .field("primary", &self.primary)
            .field("lazy", &self.lazy)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Typed builder for a [`Definition`] producing a `T`.
///
/// Hooks and setters receive the concrete `T`; the builder erases the type
/// when [`build`](Self::build) is called.
pub struct DefinitionBuilder<T> {
    name: String,
    aliases: Vec<String>,
    capabilities: Vec<Capability>,
    dependencies: Vec<DependencyRequest>,
    properties: Vec<PropertyBinding>,
    scope: Scope,
    primary: bool,
    lazy: bool,
    create: CreateFn,
    interface_init: Option<InitFn>,
    init: Option<InitFn>,
    interface_destroy: Option<DestroyFn>,
    destroy: Option<DestroyFn>,
    views: Vec<(TypeId, ViewFn)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> DefinitionBuilder<T> {
    fn new(name: String, dependencies: Vec<DependencyRequest>, create: CreateFn) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            capabilities: Vec::new(),
            dependencies,
            properties: Vec::new(),
            scope: Scope::Singleton,
            primary: false,
            lazy: false,
            create,
            interface_init: None,
            init: None,
            interface_destroy: None,
            destroy: None,
            views: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares a capability this definition satisfies.
    pub fn capability(mut self, capability: impl Into<Capability>) -> Self {
        let capability = capability.into();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Declares several capabilities.
    pub fn capabilities<I, C>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Capability>,
    {
        for capability in capabilities {
            self = self.capability(capability);
        }
        self
    }

    /// Adds an alternative name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the scope (default [`Scope::Singleton`]).
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Shorthand for `scope(Scope::Transient)`.
    pub fn transient(self) -> Self {
        self.scope(Scope::Transient)
    }

    /// Marks this definition primary among candidates sharing a capability.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Excludes this singleton from eager startup.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Adds a property assigned after construction, in declaration order.
    pub fn property<F>(mut self, name: impl Into<String>, value: impl Into<PropertyValue>, setter: F) -> Self
    where
        F: Fn(&mut T, Resolved) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let site = format!("property '{}' of '{}'", name, self.name);
        let assign: AssignFn = Arc::new(move |target: &mut AnyMut, value: Resolved| {
            let target = downcast_target::<T>(target, &site)?;
            setter(target, value)
        });
        self.properties.push(PropertyBinding { name, value: value.into(), assign });
        self
    }

    /// Sets the explicit init hook, run after properties are assigned.
    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let site = format!("init hook of '{}'", self.name);
        self.init = Some(Arc::new(move |target: &mut AnyMut| {
            hook(downcast_target::<T>(target, &site)?)
        }));
        self
    }

    /// Sets the explicit destroy hook, run for singletons at shutdown.
    pub fn destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let site = format!("destroy hook of '{}'", self.name);
        self.destroy = Some(Arc::new(move |target: &AnyMut| {
            let target = target.downcast_ref::<T>().ok_or_else(|| mismatch::<T>(&site))?;
            hook(target)
        }));
        self
    }

    /// Exposes `T` as `Arc<V>`, typically a trait object, through
    /// [`Instance::view`](crate::Instance::view).
    pub fn view<V>(mut self, cast: impl Fn(Arc<T>) -> Arc<V> + Send + Sync + 'static) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        let view: ViewFn = Arc::new(move |value: &AnyArc| {
            let concrete = value.clone().downcast::<T>().ok()?;
            Some(Box::new(cast(concrete)) as AnyBox)
        });
        self.views.retain(|(id, _)| *id != TypeId::of::<Arc<V>>());
        self.views.push((TypeId::of::<Arc<V>>(), view));
        self
    }

    /// Finishes the definition.
    pub fn build(self) -> Definition {
        let init_hooks = self.interface_init.into_iter().chain(self.init).collect();
        let destroy_hooks = self.interface_destroy.into_iter().chain(self.destroy).collect();
        Definition {
            name: self.name,
            aliases: self.aliases,
            capabilities: self.capabilities,
            dependencies: self.dependencies,
            properties: self.properties,
            scope: self.scope,
            primary: self.primary,
            lazy: self.lazy,
            type_name: type_name::<T>(),
            create: self.create,
            init_hooks,
            destroy_hooks,
            views: self.views,
        }
    }
}

impl<T: Initialize> DefinitionBuilder<T> {
    /// Runs [`Initialize::after_properties_set`] before the explicit init hook.
    pub fn initializing(mut self) -> Self {
        let site = format!("initializer of '{}'", self.name);
        self.interface_init = Some(Arc::new(move |target: &mut AnyMut| {
            downcast_target::<T>(target, &site)?.after_properties_set()
        }));
        self
    }
}

impl<T: Dispose> DefinitionBuilder<T> {
    /// Runs [`Dispose::dispose`] before the explicit destroy hook.
    pub fn disposable(mut self) -> Self {
        let site = format!("disposer of '{}'", self.name);
        self.interface_destroy = Some(Arc::new(move |target: &AnyMut| {
            target.downcast_ref::<T>().ok_or_else(|| mismatch::<T>(&site))?.dispose()
        }));
        self
    }
}

fn downcast_target<'a, T: Any>(target: &'a mut AnyMut, site: &str) -> Result<&'a mut T, BoxError> {
    target.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(site))
}

fn mismatch<T>(site: &str) -> BoxError {
    Box::new(DiError::TypeMismatch {
        expected: type_name::<T>(),
        site: site.to_string(),
    })
}
