//! Lifecycle driver: initialization callbacks and per-instance state.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::definition::Definition;
use crate::error::{BoxError, DiError, DiResult};

/// Progress of a singleton through its lifecycle.
///
/// States only move forward: `Constructed` → `Populated` → `Initialized` →
/// `Destroyed`. Transients are never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Constructor returned
    Constructed,
    /// Every property assigned
    Populated,
    /// Init hooks and post-processors ran; the instance is published
    Initialized,
    /// Destroy hooks ran during shutdown
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Constructed => "constructed",
            LifecycleState::Populated => "populated",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Destroyed => "destroyed",
        };
        f.write_str(label)
    }
}

/// Hook applied to every component around its init hooks.
///
/// Post-processors run in registration order for every scope. They may
/// mutate the component in place but cannot replace it.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{BoxError, ContainerBuilder, Definition, PostProcessor};
/// use std::any::Any;
/// use std::sync::Arc;
///
/// struct Greeting(String);
///
/// struct Shout;
/// impl PostProcessor for Shout {
///     fn after_init(&self, _name: &str, component: &mut (dyn Any + Send + Sync)) -> Result<(), BoxError> {
///         if let Some(greeting) = component.downcast_mut::<Greeting>() {
///             greeting.0 = greeting.0.to_uppercase();
///         }
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.add_post_processor(Arc::new(Shout));
/// builder.register(Definition::factory("greeting", || Ok(Greeting("hi".into()))).build()).unwrap();
/// let container = builder.build().unwrap();
/// assert_eq!(container.get_as::<Greeting>("greeting").unwrap().0, "HI");
/// ```
pub trait PostProcessor: Send + Sync {
    /// Runs after properties are assigned, before any init hook.
    fn before_init(&self, _name: &str, _component: &mut (dyn Any + Send + Sync)) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after every init hook.
    fn after_init(&self, _name: &str, _component: &mut (dyn Any + Send + Sync)) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Runs post-processors and init hooks in order: every `before_init`, the
/// interface initializer, the explicit init hook, then every `after_init`.
///
/// The first failure aborts and is reported as
/// [`DiError::ConstructionFailed`] for `definition`.
pub(crate) fn initialize(
    definition: &Definition,
    component: &mut (dyn Any + Send + Sync),
    post_processors: &[Arc<dyn PostProcessor>],
) -> DiResult<()> {
    let name = definition.name();
    let failed = |source: BoxError| DiError::ConstructionFailed {
        name: name.to_string(),
        source,
    };

    for processor in post_processors {
        processor.before_init(name, &mut *component).map_err(failed)?;
    }
    for hook in definition.init_hooks() {
        hook(&mut *component).map_err(failed)?;
    }
    for processor in post_processors {
        processor.after_init(name, &mut *component).map_err(failed)?;
    }
    if definition.has_init_hook() {
        tracing::trace!(name, "init hooks completed");
    }
    Ok(())
}
