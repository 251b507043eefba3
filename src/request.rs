//! Dependency requests.

use std::fmt;

use crate::key::Capability;

/// How many candidates a request accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// Exactly one instance, chosen by qualifier, uniqueness, or primary marker
    Single,
    /// Every matching instance, keyed by definition name in registration order
    Collection,
}

/// A request for a dependency by capability.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{DependencyRequest, Multiplicity};
///
/// let finder = DependencyRequest::single("MovieFinder");
/// assert!(finder.required);
/// assert_eq!(finder.multiplicity, Multiplicity::Single);
///
/// let qualified = DependencyRequest::single("MovieCatalog").qualified("main");
/// assert_eq!(qualified.qualifier.as_deref(), Some("main"));
///
/// let optional = DependencyRequest::single("NoImplements").optional();
/// assert!(!optional.required);
///
/// let all = DependencyRequest::collection("MessageSender");
/// assert_eq!(all.multiplicity, Multiplicity::Collection);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRequest {
    /// Capability the dependency must satisfy
    pub capability: Capability,
    /// Name or alias narrowing a single request to one candidate
    pub qualifier: Option<String>,
    /// Whether a missing single dependency is an error (default `true`)
    pub required: bool,
    /// Single instance or name-keyed collection
    pub multiplicity: Multiplicity,
}

impl DependencyRequest {
    /// Required single-instance request.
    pub fn single(capability: impl Into<Capability>) -> Self {
        Self {
            capability: capability.into(),
            qualifier: None,
            required: true,
            multiplicity: Multiplicity::Single,
        }
    }

    /// Collection request; an empty result is never an error.
    pub fn collection(capability: impl Into<Capability>) -> Self {
        Self {
            capability: capability.into(),
            qualifier: None,
            required: true,
            multiplicity: Multiplicity::Collection,
        }
    }

    /// Narrows the request to the candidate with this name or alias.
    ///
    /// Ignored by collection requests.
    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Marks the request optional: no candidate resolves to absent.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl fmt::Display for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.multiplicity {
            Multiplicity::Single => write!(f, "<{}>", self.capability)?,
            Multiplicity::Collection => write!(f, "<{}*>", self.capability)?,
        }
        if let Some(qualifier) = &self.qualifier {
            write!(f, "@{}", qualifier)?;
        }
        if !self.required {
            f.write_str("?")?;
        }
        Ok(())
    }
}
