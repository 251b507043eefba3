//! External values and container options.
//!
//! A [`ValueSource`] supplies the text behind `${key:default}` property
//! placeholders. [`ContainerOptions`] tunes construction and can itself be
//! read from a value source.

use std::env;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{DiError, DiResult};
use crate::internal::MAX_DEPTH;

/// Provider of external values by key.
pub trait ValueSource: Send + Sync + fmt::Debug {
    /// Value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// All keys this source can answer, where enumerable.
    fn keys(&self) -> Vec<String>;
}

/// In-memory value source.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{MapValueSource, ValueSource};
///
/// let values = MapValueSource::new()
///     .with("app.name", "movies")
///     .with("app.port", "8080");
/// assert_eq!(values.get("app.port").as_deref(), Some("8080"));
/// assert_eq!(values.get("app.host"), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MapValueSource {
    values: AHashMap<String, String>,
}

impl MapValueSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapValueSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl ValueSource for MapValueSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Environment variable value source
///
/// Keys map to variable names by upper-casing and replacing `.` and `-` with
/// `_`, after an optional prefix: with prefix `APP`, `db.max-connections`
/// reads `APP_DB_MAX_CONNECTIONS`.
#[derive(Debug, Default, Clone)]
pub struct EnvValueSource {
    prefix: Option<String>,
}

impl EnvValueSource {
    /// Reads unprefixed variables.
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Reads variables named `PREFIX_KEY`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }

    /// Environment variable consulted for `key`.
    pub fn variable_for(&self, key: &str) -> String {
        let key: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key),
            None => key,
        }
    }
}

impl ValueSource for EnvValueSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.variable_for(key)).ok()
    }

    fn keys(&self) -> Vec<String> {
        env::vars()
            .filter_map(|(name, _)| match &self.prefix {
                Some(prefix) => {
                    let prefix = format!("{}_", prefix.to_uppercase());
                    name.strip_prefix(&prefix).map(|rest| rest.to_lowercase().replace('_', "."))
                }
                None => Some(name.to_lowercase().replace('_', ".")),
            })
            .collect()
    }
}

/// Sources consulted in order; the first one holding a key wins.
#[derive(Debug, Default, Clone)]
pub struct ChainedValueSource {
    sources: Vec<Arc<dyn ValueSource>>,
}

impl ChainedValueSource {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority source.
    pub fn then(mut self, source: impl ValueSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Appends a shared lower-priority source.
    pub fn then_shared(mut self, source: Arc<dyn ValueSource>) -> Self {
        self.sources.push(source);
        self
    }
}

impl ValueSource for ChainedValueSource {
    fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get(key))
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.iter().flat_map(|s| s.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Tuning for a built container.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerOptions, MapValueSource};
///
/// let options = ContainerOptions::default().eager_singletons(true);
/// assert!(options.is_eager());
///
/// let values = MapValueSource::new()
///     .with("container.max-depth", "64")
///     .with("container.validate-on-build", "true");
/// let options = ContainerOptions::from_source(&values).unwrap();
/// assert_eq!(options.max_depth_limit(), 64);
/// assert!(options.validates_on_build());
/// assert!(!options.is_eager());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    max_depth: usize,
    eager_singletons: bool,
    validate_on_build: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            eager_singletons: false,
            validate_on_build: false,
        }
    }
}

impl ContainerOptions {
    /// Key for [`max_depth`](Self::max_depth)
    pub const MAX_DEPTH_KEY: &'static str = "container.max-depth";
    /// Key for [`eager_singletons`](Self::eager_singletons)
    pub const EAGER_KEY: &'static str = "container.eager-singletons";
    /// Key for [`validate_on_build`](Self::validate_on_build)
    pub const VALIDATE_KEY: &'static str = "container.validate-on-build";

    /// Bound on nested construction depth (default 128).
    ///
    /// Each level recurses on the calling thread, so raising the bound also
    /// raises the stack the caller needs.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Build every non-lazy singleton during `build`, failing on the first error.
    pub fn eager_singletons(mut self, eager: bool) -> Self {
        self.eager_singletons = eager;
        self
    }

    /// Run static validation during `build` and fail on any error it reports.
    pub fn validate_on_build(mut self, validate: bool) -> Self {
        self.validate_on_build = validate;
        self
    }

    /// Current depth bound
    pub fn max_depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Whether singletons are created during `build`
    pub fn is_eager(&self) -> bool {
        self.eager_singletons
    }

    /// Whether `build` validates first
    pub fn validates_on_build(&self) -> bool {
        self.validate_on_build
    }

    /// Reads options from `source`, keeping defaults for missing keys.
    pub fn from_source(source: &dyn ValueSource) -> DiResult<Self> {
        let mut options = Self::default();
        if let Some(depth) = read::<usize>(source, Self::MAX_DEPTH_KEY)? {
            options.max_depth = depth;
        }
        if let Some(eager) = read::<bool>(source, Self::EAGER_KEY)? {
            options.eager_singletons = eager;
        }
        if let Some(validate) = read::<bool>(source, Self::VALIDATE_KEY)? {
            options.validate_on_build = validate;
        }
        Ok(options)
    }
}

fn read<T: std::str::FromStr>(source: &dyn ValueSource, key: &str) -> DiResult<Option<T>> {
    match source.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| DiError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            site: format!("value '{}' = {:?}", key, raw),
        }),
    }
}
