//! Property values and external-value placeholders.

use std::fmt;

use crate::request::DependencyRequest;

/// Source of a property value assigned after construction.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::PropertyValue;
///
/// assert_eq!(
///     PropertyValue::placeholder("${app.port:8080}"),
///     PropertyValue::External { key: "app.port".into(), default: Some("8080".into()) },
/// );
/// assert_eq!(
///     PropertyValue::placeholder("${app.name}"),
///     PropertyValue::External { key: "app.name".into(), default: None },
/// );
/// assert_eq!(PropertyValue::placeholder("plain"), PropertyValue::Literal("plain".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Fixed text
    Literal(String),
    /// Another component, resolved like a constructor dependency
    Dependency(DependencyRequest),
    /// Value looked up in the container's value source by `key`, falling back to `default`
    External {
        /// Key in the value source
        key: String,
        /// Fallback when the key is missing; `Some("")` is a valid empty default
        default: Option<String>,
    },
}

impl PropertyValue {
    /// Literal text.
    pub fn literal(value: impl Into<String>) -> Self {
        PropertyValue::Literal(value.into())
    }

    /// A dependency on another component.
    pub fn dependency(request: DependencyRequest) -> Self {
        PropertyValue::Dependency(request)
    }

    /// Required external value.
    pub fn external(key: impl Into<String>) -> Self {
        PropertyValue::External { key: key.into(), default: None }
    }

    /// External value with a fallback.
    pub fn external_or(key: impl Into<String>, default: impl Into<String>) -> Self {
        PropertyValue::External { key: key.into(), default: Some(default.into()) }
    }

    /// Parses a `${key}` or `${key:default}` expression.
    ///
    /// The default is everything after the first `:`, so it may itself contain
    /// colons. Text that is not wrapped in `${...}` is a literal.
    pub fn placeholder(expression: &str) -> Self {
        match parse_placeholder(expression) {
            Some((key, default)) => PropertyValue::External {
                key: key.to_string(),
                default: default.map(str::to_string),
            },
            None => PropertyValue::Literal(expression.to_string()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Literal(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Literal(value)
    }
}

impl From<DependencyRequest> for PropertyValue {
    fn from(request: DependencyRequest) -> Self {
        PropertyValue::Dependency(request)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Literal(text) => write!(f, "{:?}", text),
            PropertyValue::Dependency(request) => write!(f, "{}", request),
            PropertyValue::External { key, default: Some(default) } => write!(f, "${{{}:{}}}", key, default),
            PropertyValue::External { key, default: None } => write!(f, "${{{}}}", key),
        }
    }
}

fn parse_placeholder(expression: &str) -> Option<(&str, Option<&str>)> {
    let inner = expression.strip_prefix("${")?.strip_suffix('}')?;
    let (key, default) = match inner.split_once(':') {
        Some((key, default)) => (key, Some(default)),
        None => (inner, None),
    };
    if key.is_empty() {
        return None;
    }
    Some((key, default))
}
