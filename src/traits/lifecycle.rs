//! Lifecycle callback traits for components that manage their own setup and teardown.

use crate::error::BoxError;

/// Initialization callback run after properties are assigned.
///
/// Opt in with [`DefinitionBuilder::initializing`](crate::DefinitionBuilder::initializing).
/// Runs before any explicit [`init`](crate::DefinitionBuilder::init) hook, for
/// every scope.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{BoxError, ContainerBuilder, Definition, Initialize};
///
/// struct Pool {
///     size: usize,
///     warmed: bool,
/// }
///
/// impl Initialize for Pool {
///     fn after_properties_set(&mut self) -> Result<(), BoxError> {
///         if self.size == 0 {
///             return Err("pool size must be positive".into());
///         }
///         self.warmed = true;
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(
///     Definition::factory("pool", || Ok(Pool { size: 4, warmed: false }))
///         .initializing()
///         .build(),
/// ).unwrap();
/// let container = builder.build().unwrap();
/// let pool = container.get_as::<Pool>("pool").unwrap();
/// assert!(pool.warmed);
/// ```
pub trait Initialize: Send + Sync + 'static {
    /// Completes setup once every property has been assigned.
    fn after_properties_set(&mut self) -> Result<(), BoxError>;
}

/// Trait for synchronous resource disposal.
///
/// Implement this trait for singletons that need structured teardown (e.g.,
/// flushing caches, closing connections). Opt in with
/// [`DefinitionBuilder::disposable`](crate::DefinitionBuilder::disposable);
/// hooks run in reverse construction order during
/// [`Container::shutdown`](crate::Container::shutdown), before any explicit
/// [`destroy`](crate::DefinitionBuilder::destroy) hook.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{BoxError, ContainerBuilder, Definition, Dispose};
///
/// struct Cache {
///     name: String,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) -> Result<(), BoxError> {
///         println!("Flushing cache: {}", self.name);
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(
///     Definition::factory("cache", || Ok(Cache { name: "user_cache".to_string() }))
///         .disposable()
///         .build(),
/// ).unwrap();
/// let container = builder.build().unwrap();
/// container.get("cache").unwrap();
/// container.shutdown().unwrap();
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> Result<(), BoxError>;
}
