//! Definition registry: name, alias, and capability indexes over registered definitions.

use std::sync::Arc;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::key::Capability;

/// Candidate slots for one capability; most capabilities have few implementors
pub(crate) type Candidates = SmallVec<[usize; 4]>;

/// Registered definitions in registration order.
///
/// Every definition gets a slot (its registration index). Names and aliases
/// share one namespace; capabilities index into slots in registration order.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Capability, Definition, DefinitionRegistry, DiError};
///
/// struct Finder;
///
/// let mut registry = DefinitionRegistry::new();
/// registry.register(
///     Definition::factory("finder", || Ok(Finder)).alias("movieFinder").capability("MovieFinder").build(),
/// ).unwrap();
///
/// assert_eq!(registry.lookup_by_name("movieFinder").unwrap().name(), "finder");
/// assert_eq!(registry.lookup_by_capability(&Capability::new("MovieFinder")).len(), 1);
///
/// let clash = registry.register(Definition::factory("movieFinder", || Ok(Finder)).build());
/// assert!(matches!(clash, Err(DiError::DuplicateName(n)) if n == "movieFinder"));
/// ```
#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: Vec<Arc<Definition>>,
    names: AHashMap<String, usize>,
    by_capability: AHashMap<Capability, Candidates>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Adds a definition.
    ///
    /// Fails with [`DiError::DuplicateName`] when the name or any alias is
    /// already in use, including by the definition itself; the registry is
    /// left unchanged on failure.
    pub fn register(&mut self, definition: Definition) -> DiResult<()> {
        let mut claimed: SmallVec<[&str; 4]> = SmallVec::new();
        for name in std::iter::once(definition.name()).chain(definition.aliases().iter().map(String::as_str)) {
            if self.names.contains_key(name) || claimed.contains(&name) {
                return Err(DiError::DuplicateName(name.to_string()));
            }
            claimed.push(name);
        }

        let slot = self.definitions.len();
        for name in claimed {
            self.names.insert(name.to_string(), slot);
        }
        for capability in definition.capabilities() {
            self.by_capability.entry(capability.clone()).or_default().push(slot);
        }

        tracing::debug!(name = definition.name(), slot, "definition registered");
        self.definitions.push(Arc::new(definition));
        Ok(())
    }

    /// Definition registered under `name` or an alias of it.
    pub fn lookup_by_name(&self, name: &str) -> DiResult<&Arc<Definition>> {
        self.slot_of(name)
            .map(|slot| &self.definitions[slot])
            .ok_or_else(|| DiError::NotFound(name.to_string()))
    }

    /// Definitions satisfying `capability`, in registration order.
    pub fn lookup_by_capability(&self, capability: &Capability) -> Vec<&Arc<Definition>> {
        self.candidates(capability).iter().map(|&slot| &self.definitions[slot]).collect()
    }

    /// Whether `name` is a registered name or alias
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Registered definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Definition>> {
        self.definitions.iter()
    }

    /// Registered names (not aliases) in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name())
    }

    pub(crate) fn slot_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub(crate) fn candidates(&self, capability: &Capability) -> &[usize] {
        self.by_capability
            .get(capability.as_str())
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn at(&self, slot: usize) -> &Arc<Definition> {
        &self.definitions[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unit;

    fn def(name: &str) -> crate::definition::DefinitionBuilder<Unit> {
        Definition::factory(name.to_string(), || Ok(Unit))
    }

    #[test]
    fn alias_may_not_repeat_own_name() {
        let mut registry = DefinitionRegistry::new();
        let err = registry.register(def("a").alias("a").build()).unwrap_err();
        assert!(matches!(err, DiError::DuplicateName(n) if n == "a"));
        assert!(registry.is_empty());
        assert!(!registry.contains("a"));
    }

    #[test]
    fn alias_collides_with_existing_name() {
        let mut registry = DefinitionRegistry::new();
        registry.register(def("a").build()).unwrap();
        let err = registry.register(def("b").alias("a").build()).unwrap_err();
        assert!(matches!(err, DiError::DuplicateName(n) if n == "a"));
        assert!(!registry.contains("b"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn capability_candidates_keep_registration_order() {
        let mut registry = DefinitionRegistry::new();
        registry.register(def("sms").capability("Sender").build()).unwrap();
        registry.register(def("other").capability("Other").build()).unwrap();
        registry.register(def("email").capability("Sender").build()).unwrap();

        let names: Vec<_> = registry
            .lookup_by_capability(&Capability::new("Sender"))
            .into_iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, ["sms", "email"]);
        assert!(registry.lookup_by_capability(&Capability::new("Missing")).is_empty());
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = DefinitionRegistry::new();
        assert!(matches!(registry.lookup_by_name("ghost"), Err(DiError::NotFound(n)) if n == "ghost"));
    }
}
