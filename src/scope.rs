//! Component scope definitions.

/// Scope controlling instance reuse
///
/// Defines whether the container caches and owns an instance, or hands a
/// fresh one to every requester.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerBuilder, Definition, Scope};
///
/// struct Counter;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(Definition::factory("shared", || Ok(Counter)).build()).unwrap();
/// builder.register(
///     Definition::factory("fresh", || Ok(Counter)).scope(Scope::Transient).build(),
/// ).unwrap();
/// let container = builder.build().unwrap();
///
/// // Singleton: same instance on every request
/// let a = container.get("shared").unwrap();
/// let b = container.get("shared").unwrap();
/// assert!(a.ptr_eq(&b));
///
/// // Transient: new instance on every request
/// let c = container.get("fresh").unwrap();
/// let d = container.get("fresh").unwrap();
/// assert!(!c.ptr_eq(&d));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Single instance per container, cached until shutdown
    ///
    /// Built on first request, cached for the container's lifetime, and
    /// destroyed during [`Container::shutdown`](crate::Container::shutdown)
    /// in reverse construction order.
    #[default]
    Singleton,
    /// New instance per request, never cached
    ///
    /// The container runs init hooks but keeps no reference afterwards and
    /// never runs destroy hooks; cleanup belongs to the requester.
    Transient,
}

impl Scope {
    /// Whether instances of this scope are owned (cached and destroyed) by the container.
    pub fn is_container_owned(self) -> bool {
        matches!(self, Scope::Singleton)
    }
}
