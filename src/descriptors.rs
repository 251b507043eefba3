//! Definition descriptors for introspection and diagnostics.

use crate::definition::Definition;
use crate::key::Capability;
use crate::request::DependencyRequest;
use crate::scope::Scope;

/// Snapshot of a registered definition for introspection and diagnostics
///
/// Contains the metadata of a definition without its callbacks, so it can be
/// cloned, logged, and compared freely.
///
/// # Use Cases
///
/// - **Debugging**: Inspect what components are registered and their scopes
/// - **Validation**: Check which capabilities have several implementors
/// - **Documentation**: Generate dependency graphs from `dependencies`
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerBuilder, Definition, DependencyRequest, Scope};
///
/// struct Database;
/// struct Repository;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(Definition::factory("database", || Ok(Database)).capability("Database").build()).unwrap();
/// builder.register(
///     Definition::constructor("repository", [DependencyRequest::single("Database")], |_| Ok(Repository))
///         .alias("repo")
///         .transient()
///         .build(),
/// ).unwrap();
///
/// let descriptors = builder.descriptors();
/// let repo = descriptors.iter().find(|d| d.name == "repository").unwrap();
/// assert_eq!(repo.scope, Scope::Transient);
/// assert_eq!(repo.aliases, ["repo"]);
/// assert_eq!(repo.dependencies.len(), 1);
///
/// let singleton_count = descriptors.iter().filter(|d| d.scope == Scope::Singleton).count();
/// assert_eq!(singleton_count, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionDescriptor {
    /// Unique name
    pub name: String,
    /// Alternative names
    pub aliases: Vec<String>,
    /// Capability tags
    pub capabilities: Vec<Capability>,
    /// Constructor and property dependencies
    pub dependencies: Vec<DependencyRequest>,
    /// Property names in assignment order
    pub properties: Vec<String>,
    /// Instance reuse policy
    pub scope: Scope,
    /// Primary marker
    pub primary: bool,
    /// Excluded from eager startup
    pub lazy: bool,
    /// Rust type produced
    pub type_name: &'static str,
    /// Whether init hooks are declared
    pub has_init_hook: bool,
    /// Whether destroy hooks are declared
    pub has_destroy_hook: bool,
}

impl DefinitionDescriptor {
    /// Whether `name` is the descriptor's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Whether the container destroys instances of this definition
    pub fn is_container_owned(&self) -> bool {
        self.scope.is_container_owned()
    }
}

impl From<&Definition> for DefinitionDescriptor {
    fn from(definition: &Definition) -> Self {
        Self {
            name: definition.name().to_string(),
            aliases: definition.aliases().to_vec(),
            capabilities: definition.capabilities().to_vec(),
            dependencies: definition.all_dependencies().cloned().collect(),
            properties: definition.properties().map(|(name, _)| name.to_string()).collect(),
            scope: definition.scope(),
            primary: definition.is_primary(),
            lazy: definition.is_lazy(),
            type_name: definition.type_name(),
            has_init_hook: definition.has_init_hook(),
            has_destroy_hook: definition.has_destroy_hook(),
        }
    }
}
