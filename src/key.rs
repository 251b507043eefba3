//! Capability tags used for non-name lookup.

use std::borrow::Borrow;
use std::fmt;

/// Capability tag a definition declares it satisfies.
///
/// Capabilities stand in for types and interfaces: the loader that produces
/// definitions decides which tags each one carries, and the container matches
/// requests against them verbatim. Two capabilities are equal when their tags
/// are equal.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Capability;
///
/// let finder = Capability::new("MovieFinder");
/// assert_eq!(finder.as_str(), "MovieFinder");
/// assert_eq!(finder, Capability::from("MovieFinder"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(String);

impl Capability {
    /// Creates a capability tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Capability(tag.into())
    }

    /// The capability tag
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Capability tag derived from a Rust type name, for loaders that tag
    /// definitions by the type they produce.
    ///
    /// ```rust
    /// use ferrous_ioc::Capability;
    ///
    /// assert_eq!(Capability::of::<String>().as_str(), "alloc::string::String");
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        Capability(std::any::type_name::<T>().to_string())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(tag: &str) -> Self {
        Capability(tag.to_string())
    }
}

impl From<String> for Capability {
    fn from(tag: String) -> Self {
        Capability(tag)
    }
}

impl From<&Capability> for Capability {
    fn from(tag: &Capability) -> Self {
        tag.clone()
    }
}

impl Borrow<str> for Capability {
    fn borrow(&self) -> &str {
        &self.0
    }
}
