//! Diagnostic observers for component lifecycle events.
//!
//! Observers receive a callback for every construction attempt and every
//! destruction, which makes them the hook for structured tracing, timing,
//! and failure accounting without touching component code.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::scope::Scope;

/// Observer trait for container lifecycle events.
///
/// # Performance
///
/// Observer calls are made synchronously during construction, while the
/// component's build slot is claimed. Keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ContainerBuilder, ContainerObserver, DiError, Scope};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     created: Mutex<Vec<String>>,
/// }
///
/// impl ContainerObserver for Recorder {
///     fn created(&self, name: &str, _scope: Scope, _duration: Duration) {
///         self.created.lock().unwrap().push(name.to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut builder = ContainerBuilder::new();
/// builder.add_observer(recorder.clone());
/// let container = builder.build().unwrap();
/// assert!(recorder.created.lock().unwrap().is_empty());
/// ```
pub trait ContainerObserver: Send + Sync {
    /// Construction of `name` is starting.
    fn creating(&self, _name: &str, _scope: Scope) {}

    /// `name` was constructed, populated, and initialized in `duration`.
    fn created(&self, _name: &str, _scope: Scope, _duration: Duration) {}

    /// Construction of `name` failed.
    fn creation_failed(&self, _name: &str, _error: &DiError) {}

    /// The destroy hooks of singleton `name` ran; `clean` is false if any failed.
    fn destroyed(&self, _name: &str, _clean: bool) {}
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn creating(&self, name: &str, scope: Scope) {
        for observer in &self.observers {
            observer.creating(name, scope);
        }
    }

    #[inline]
    pub(crate) fn created(&self, name: &str, scope: Scope, duration: Duration) {
        for observer in &self.observers {
            observer.created(name, scope, duration);
        }
    }

    #[inline]
    pub(crate) fn creation_failed(&self, name: &str, error: &DiError) {
        for observer in &self.observers {
            observer.creation_failed(name, error);
        }
    }

    #[inline]
    pub(crate) fn destroyed(&self, name: &str, clean: bool) {
        for observer in &self.observers {
            observer.destroyed(name, clean);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// The container already logs its own decisions at `debug`/`trace`; this
/// observer adds one `info` event per construction with timing, which is
/// convenient for startup profiling.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ContainerBuilder, TracingObserver};
/// use std::sync::Arc;
///
/// let mut builder = ContainerBuilder::new();
/// builder.add_observer(Arc::new(TracingObserver::new()));
/// let container = builder.build().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: &'static str,
}

impl TracingObserver {
    /// Creates a tracing observer.
    pub fn new() -> Self {
        Self { label: "ferrous_ioc" }
    }

    /// Label attached to every event as the `observer` field.
    pub fn with_label(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for TracingObserver {
    fn creating(&self, name: &str, scope: Scope) {
        tracing::trace!(observer = self.label, name, ?scope, "creating component");
    }

    fn created(&self, name: &str, scope: Scope, duration: Duration) {
        tracing::info!(observer = self.label, name, ?scope, ?duration, "component created");
    }

    fn creation_failed(&self, name: &str, error: &DiError) {
        tracing::warn!(observer = self.label, name, %error, "component creation failed");
    }

    fn destroyed(&self, name: &str, clean: bool) {
        tracing::info!(observer = self.label, name, clean, "component destroyed");
    }
}

/// Observer that counts lifecycle events and accumulates construction time.
pub struct MetricsObserver {
    created: AtomicU64,
    failed: AtomicU64,
    destroyed: AtomicU64,
    total_creation_nanos: AtomicU64,
}

impl MetricsObserver {
    /// Creates a new metrics observer.
    pub fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            total_creation_nanos: AtomicU64::new(0),
        }
    }

    /// Successful constructions observed
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Failed constructions observed
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Singletons destroyed
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed.load(Ordering::Relaxed)
    }

    /// Mean construction time, if anything was created.
    pub fn average_creation_time(&self) -> Option<Duration> {
        let count = self.created_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_creation_nanos.load(Ordering::Relaxed) / count))
    }

    /// Resets all counters.
    pub fn reset(&self) {
        self.created.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.destroyed.store(0, Ordering::Relaxed);
        self.total_creation_nanos.store(0, Ordering::Relaxed);
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for MetricsObserver {
    fn created(&self, _name: &str, _scope: Scope, duration: Duration) {
        self.created.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.total_creation_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn creation_failed(&self, _name: &str, _error: &DiError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn destroyed(&self, _name: &str, _clean: bool) {
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}
