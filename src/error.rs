//! Error types for the container.

use thiserror::Error;

/// Boxed error returned by user callbacks (constructors, setters, hooks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Container errors
///
/// Represents the failure conditions of registration, resolution,
/// construction, and shutdown. Errors raised while building a dependency are
/// wrapped in [`DiError::Creating`] layers naming each component on the way
/// back to the caller; [`DiError::root`] peels them.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerBuilder, DiError};
///
/// let container = ContainerBuilder::new().build().unwrap();
/// match container.get("missing") {
///     Err(DiError::NotFound(name)) => assert_eq!(name, "missing"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// A definition name or alias is already registered
    #[error("Definition name already in use: {0}")]
    DuplicateName(String),

    /// No definition registered under that exact name or alias
    #[error("No definition named '{0}'")]
    NotFound(String),

    /// No candidate for a required single dependency
    #[error("Unsatisfied dependency {request} at {site}")]
    Unsatisfied {
        /// Human-readable form of the request
        request: String,
        /// Where the request was made
        site: String,
    },

    /// Several candidates and not exactly one marked primary
    #[error("Ambiguous dependency {request} at {site}: candidates [{}]", .candidates.join(", "))]
    Ambiguous {
        /// Human-readable form of the request
        request: String,
        /// Where the request was made
        site: String,
        /// Names of the competing definitions, in registration order
        candidates: Vec<String>,
    },

    /// Construction re-entered a component already on the construction stack
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),

    /// External value missing from the source and no default declared
    #[error("Missing external value '{key}' at {site}")]
    MissingExternalValue {
        /// Key looked up in the value source
        key: String,
        /// Where the value was requested
        site: String,
    },

    /// A constructor, factory, setter, or hook returned an error
    #[error("Construction of '{name}' failed: {source}")]
    ConstructionFailed {
        /// Component being built
        name: String,
        /// Error raised by the user callback
        #[source]
        source: BoxError,
    },

    /// A dependency of `name` failed; `source` is the originating error
    #[error("Error creating '{name}': {source}")]
    Creating {
        /// Component whose dependency failed
        name: String,
        /// Originating error
        #[source]
        source: Box<DiError>,
    },

    /// A resolved value is not of the requested Rust type
    #[error("Type mismatch at {site}: expected {expected}")]
    TypeMismatch {
        /// Requested type name
        expected: &'static str,
        /// Where the conversion was attempted
        site: String,
    },

    /// Maximum construction depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),

    /// The container has been shut down
    #[error("Container has been shut down")]
    ContainerClosed,

    /// One or more destroy hooks failed during shutdown
    #[error("Shutdown completed with {} destroy failure(s)", .0.len())]
    Shutdown(Vec<DestroyFailure>),
}

impl DiError {
    /// Returns the originating error beneath any [`DiError::Creating`] layers.
    ///
    /// ```rust
    /// use ferrous_ioc::DiError;
    ///
    /// let err = DiError::Creating {
    ///     name: "a".into(),
    ///     source: Box::new(DiError::Circular(vec!["a".into(), "b".into(), "a".into()])),
    /// };
    /// assert!(matches!(err.root(), DiError::Circular(_)));
    /// ```
    pub fn root(&self) -> &DiError {
        let mut current = self;
        while let DiError::Creating { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Names of the components that were being created when the error surfaced,
    /// outermost first.
    pub fn creation_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let DiError::Creating { name, source } = current {
            path.push(name.as_str());
            current = &**source;
        }
        if let DiError::ConstructionFailed { name, .. } = current {
            path.push(name.as_str());
        }
        path
    }

    /// Wraps `self` with the name of the component being created.
    pub(crate) fn creating(self, name: &str) -> Self {
        DiError::Creating {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

/// A destroy hook failure collected during the shutdown sweep.
#[derive(Debug, Error)]
#[error("'{name}': {source}")]
pub struct DestroyFailure {
    /// Singleton whose destroy hook failed
    pub name: String,
    /// Error raised by the hook
    #[source]
    pub source: BoxError,
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
