//! Live instances and the resolved values handed to constructors and setters.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::definition::Definition;
use crate::error::{BoxError, DiError, DiResult};

// Type-erased storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;
pub(crate) type AnyBox = Box<dyn Any + Send + Sync>;

/// A live component produced from a [`Definition`].
///
/// Cloning an `Instance` clones the handle, not the component. Concrete access
/// goes through [`downcast`](Self::downcast); trait access goes through
/// [`view`](Self::view) using the views the definition declared.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerBuilder, Definition};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(
///     Definition::factory("english", || Ok(English))
///         .capability("Greeter")
///         .view::<dyn Greeter>(|e| e as Arc<dyn Greeter>)
///         .build(),
/// ).unwrap();
/// let container = builder.build().unwrap();
///
/// let instance = container.get("english").unwrap();
/// assert!(instance.downcast::<English>().is_some());
/// assert_eq!(instance.view::<dyn Greeter>().unwrap().greet(), "hello");
/// ```
#[derive(Clone)]
pub struct Instance {
    value: AnyArc,
    definition: Arc<Definition>,
}

impl Instance {
    pub(crate) fn new(value: AnyArc, definition: Arc<Definition>) -> Self {
        Self { value, definition }
    }

    /// Name of the definition that produced this instance
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The originating definition
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// The component as `Arc<T>`, if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// The component through a view registered with
    /// [`DefinitionBuilder::view`](crate::DefinitionBuilder::view).
    pub fn view<V: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<V>> {
        let cast = self.definition.view_for(TypeId::of::<Arc<V>>())?;
        let boxed = cast(&self.value)?;
        boxed.downcast::<Arc<V>>().ok().map(|arc| *arc)
    }

    /// The type-erased component
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }

    /// Identity comparison: true when both handles point at the same component.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.value) as *const (),
            Arc::as_ptr(&other.value) as *const (),
        )
    }

    fn typed<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| DiError::TypeMismatch {
            expected: type_name::<T>(),
            site: format!("instance '{}'", self.name()),
        })
    }

    fn viewed<V: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<V>> {
        self.view::<V>().ok_or_else(|| DiError::TypeMismatch {
            expected: type_name::<V>(),
            site: format!("instance '{}'", self.name()),
        })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name())
            .field("type", &self.definition.type_name())
            .finish()
    }
}

/// Name-keyed instances in registration order.
///
/// The result of collection resolution. Keys are definition names.
#[derive(Clone, Default)]
pub struct Components {
    entries: Vec<(String, Instance)>,
}

impl Components {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    pub(crate) fn push(&mut self, instance: Instance) {
        self.entries.push((instance.name().to_string(), instance));
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no definition matched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instance produced by the definition `name`
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, i)| i)
    }

    /// Whether the definition `name` is part of the collection
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Definition names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, instance)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), i))
    }

    /// Every instance downcast to `T`, keyed by name.
    pub fn downcast_all<T: Any + Send + Sync>(&self) -> DiResult<Vec<(String, Arc<T>)>> {
        self.entries
            .iter()
            .map(|(n, i)| i.typed::<T>().map(|t| (n.clone(), t)))
            .collect()
    }

    /// Every instance through the view `V`, keyed by name.
    pub fn views<V: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<(String, Arc<V>)>> {
        self.entries
            .iter()
            .map(|(n, i)| i.viewed::<V>().map(|v| (n.clone(), v)))
            .collect()
    }
}

impl fmt::Debug for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl IntoIterator for Components {
    type Item = (String, Instance);
    type IntoIter = std::vec::IntoIter<(String, Instance)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A resolved dependency or property value.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A single instance
    Instance(Instance),
    /// Optional single dependency with no candidate
    Absent,
    /// Collection dependency (possibly empty)
    Collection(Components),
    /// Literal or external value
    Text(String),
}

impl Resolved {
    /// Whether this is the absent outcome of an optional request
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Absent)
    }

    /// The instance, if this is a single instance
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Resolved::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// The single instance downcast to `T`.
    pub fn into_arc<T: Any + Send + Sync>(self) -> DiResult<Arc<T>> {
        match self {
            Resolved::Instance(i) => i.typed::<T>(),
            other => Err(other.mismatch(type_name::<T>())),
        }
    }

    /// The single instance through the view `V`.
    pub fn into_view<V: ?Sized + Send + Sync + 'static>(self) -> DiResult<Arc<V>> {
        match self {
            Resolved::Instance(i) => i.viewed::<V>(),
            other => Err(other.mismatch(type_name::<V>())),
        }
    }

    /// Like [`into_arc`](Self::into_arc) but maps [`Resolved::Absent`] to `None`.
    pub fn into_optional<T: Any + Send + Sync>(self) -> DiResult<Option<Arc<T>>> {
        match self {
            Resolved::Absent => Ok(None),
            other => other.into_arc::<T>().map(Some),
        }
    }

    /// Like [`into_view`](Self::into_view) but maps [`Resolved::Absent`] to `None`.
    pub fn into_optional_view<V: ?Sized + Send + Sync + 'static>(self) -> DiResult<Option<Arc<V>>> {
        match self {
            Resolved::Absent => Ok(None),
            other => other.into_view::<V>().map(Some),
        }
    }

    /// The collection.
    pub fn into_components(self) -> DiResult<Components> {
        match self {
            Resolved::Collection(c) => Ok(c),
            other => Err(other.mismatch(type_name::<Components>())),
        }
    }

    /// The literal or external value.
    pub fn into_text(self) -> DiResult<String> {
        match self {
            Resolved::Text(s) => Ok(s),
            other => Err(other.mismatch(type_name::<String>())),
        }
    }

    /// The literal or external value parsed with [`FromStr`].
    pub fn parse<F>(self) -> Result<F, BoxError>
    where
        F: FromStr,
        F::Err: Into<BoxError>,
    {
        let text = self.into_text()?;
        text.parse::<F>().map_err(Into::into)
    }

    fn mismatch(&self, expected: &'static str) -> DiError {
        let site = match self {
            Resolved::Instance(i) => format!("instance '{}'", i.name()),
            Resolved::Absent => "absent value".to_string(),
            Resolved::Collection(_) => "collection value".to_string(),
            Resolved::Text(_) => "text value".to_string(),
        };
        DiError::TypeMismatch { expected, site }
    }
}

/// Resolved constructor arguments, in the order the definition declared them.
pub struct Args<'a> {
    component: &'a str,
    values: Vec<Resolved>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(component: &'a str, values: Vec<Resolved>) -> Self {
        Self { component, values }
    }

    /// Name of the component being constructed
    pub fn component(&self) -> &str {
        self.component
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the constructor declared no dependencies
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw resolved argument at `index`.
    pub fn get(&self, index: usize) -> DiResult<&Resolved> {
        self.values.get(index).ok_or_else(|| DiError::TypeMismatch {
            expected: "constructor argument",
            site: format!("'{}' argument #{}", self.component, index),
        })
    }

    /// Argument `index` as `Arc<T>`.
    pub fn arc<T: Any + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        self.get(index)?.clone().into_arc::<T>()
    }

    /// Argument `index` through the view `V`.
    pub fn view<V: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<V>> {
        self.get(index)?.clone().into_view::<V>()
    }

    /// Optional argument `index` as `Arc<T>`.
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> DiResult<Option<Arc<T>>> {
        self.get(index)?.clone().into_optional::<T>()
    }

    /// Optional argument `index` through the view `V`.
    pub fn optional_view<V: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Option<Arc<V>>> {
        self.get(index)?.clone().into_optional_view::<V>()
    }

    /// Collection argument `index`.
    pub fn components(&self, index: usize) -> DiResult<Components> {
        self.get(index)?.clone().into_components()
    }
}
