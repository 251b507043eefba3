//! Static validation of a definition set before any component is built.
//!
//! Walks every dependency request with the same selection rules the
//! container uses at runtime, so configuration errors surface without running
//! a single constructor.
//!
//! # Validation Rules
//!
//! - **Unsatisfied**: Error - a required request has no candidate
//! - **Ambiguous**: Error - several candidates and not exactly one primary
//! - **Cycle**: Error - definitions that depend on each other in a cycle
//! - **Missing external value**: Error - no value in the source and no default
//! - **Singleton → Transient**: Warning - the singleton keeps the one transient it was built with

use std::fmt;
use std::sync::Arc;

use crate::config::ValueSource;
use crate::definition::{Definition, PropertyValue};
use crate::error::DiError;
use crate::provider::resolver::{select, Selection};
use crate::registry::DefinitionRegistry;
use crate::scope::Scope;

/// A validation error that would make construction fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required dependency without a candidate
    Unsatisfied {
        /// Definition declaring the request
        component: String,
        /// Human-readable request
        request: String,
    },
    /// Several candidates and not exactly one primary
    Ambiguous {
        /// Definition declaring the request
        component: String,
        /// Human-readable request
        request: String,
        /// Competing definitions
        candidates: Vec<String>,
    },
    /// Definitions depending on each other; the first name is repeated at the end
    Cycle {
        /// Names along the cycle
        path: Vec<String>,
    },
    /// External value absent from the source with no default
    MissingExternalValue {
        /// Definition declaring the property
        component: String,
        /// Key looked up
        key: String,
    },
}

/// A validation warning about a configuration that works but may surprise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Singleton depends on transient (will always hold the same instance)
    SingletonDependsOnTransient {
        /// Dependent singleton
        singleton: String,
        /// Transient dependency
        transient: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Unsatisfied { component, request } => {
                write!(f, "'{}' requires {} but nothing provides it", component, request)
            }
            ValidationError::Ambiguous { component, request, candidates } => write!(
                f,
                "'{}' requires {} but it is ambiguous between {}",
                component,
                request,
                candidates.join(", ")
            ),
            ValidationError::Cycle { path } => write!(f, "Circular dependency detected: {}", path.join(" -> ")),
            ValidationError::MissingExternalValue { component, key } => {
                write!(f, "'{}' needs external value '{}' which is not set", component, key)
            }
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::SingletonDependsOnTransient { singleton, transient } => write!(
                f,
                "Singleton '{}' depends on transient '{}' - will always get same instance",
                singleton, transient
            ),
        }
    }
}

impl From<ValidationError> for DiError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::Unsatisfied { component, request } => DiError::Unsatisfied {
                request,
                site: format!("'{}'", component),
            },
            ValidationError::Ambiguous { component, request, candidates } => DiError::Ambiguous {
                request,
                site: format!("'{}'", component),
                candidates,
            },
            ValidationError::Cycle { path } => DiError::Circular(path),
            ValidationError::MissingExternalValue { component, key } => DiError::MissingExternalValue {
                key,
                site: format!("'{}'", component),
            },
        }
    }
}

/// Result of static validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Errors that would make construction fail
    pub errors: Vec<ValidationError>,
    /// Warnings about potentially problematic configurations
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }
}

/// Validates every definition in `registry` against `values`.
pub(crate) fn validate(registry: &DefinitionRegistry, values: &Arc<dyn ValueSource>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); registry.len()];

    for (slot, definition) in registry.iter().enumerate() {
        for request in definition.all_dependencies() {
            match select(registry, request, definition.name()) {
                Ok(Selection::One(target)) => {
                    note_scopes(registry, definition, target, &mut report);
                    edges[slot].push(target);
                }
                Ok(Selection::All(targets)) => {
                    for &target in &targets {
                        note_scopes(registry, definition, target, &mut report);
                    }
                    edges[slot].extend(targets);
                }
                Ok(Selection::Absent) => {}
                Err(DiError::Ambiguous { request, candidates, .. }) => {
                    report.errors.push(ValidationError::Ambiguous {
                        component: definition.name().to_string(),
                        request,
                        candidates,
                    });
                }
                Err(_) => {
                    report.errors.push(ValidationError::Unsatisfied {
                        component: definition.name().to_string(),
                        request: request.to_string(),
                    });
                }
            }
        }

        for (_, value) in definition.properties() {
            if let PropertyValue::External { key, default: None } = value {
                if values.get(key).is_none() {
                    report.errors.push(ValidationError::MissingExternalValue {
                        component: definition.name().to_string(),
                        key: key.clone(),
                    });
                }
            }
        }
    }

    for path in find_cycles(&edges) {
        report.errors.push(ValidationError::Cycle {
            path: path.into_iter().map(|slot| registry.at(slot).name().to_string()).collect(),
        });
    }

    if !report.is_valid() {
        tracing::debug!(errors = report.errors.len(), "validation found errors");
    }
    report
}

fn note_scopes(registry: &DefinitionRegistry, dependent: &Definition, target: usize, report: &mut ValidationReport) {
    let dependency = registry.at(target);
    if dependent.scope() == Scope::Singleton && dependency.scope() == Scope::Transient {
        let warning = ValidationWarning::SingletonDependsOnTransient {
            singleton: dependent.name().to_string(),
            transient: dependency.name().to_string(),
        };
        if !report.warnings.contains(&warning) {
            report.warnings.push(warning);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Every elementary cycle reachable by depth-first search, each reported once
/// starting at its first-visited node.
fn find_cycles(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut path = Vec::new();
    let mut cycles = Vec::new();

    for start in 0..edges.len() {
        if marks[start] == Mark::Unvisited {
            visit(start, edges, &mut marks, &mut path, &mut cycles);
        }
    }
    cycles
}

fn visit(node: usize, edges: &[Vec<usize>], marks: &mut [Mark], path: &mut Vec<usize>, cycles: &mut Vec<Vec<usize>>) {
    marks[node] = Mark::OnPath;
    path.push(node);

    for &next in &edges[node] {
        match marks[next] {
            Mark::OnPath => {
                if let Some(start) = path.iter().position(|&n| n == next) {
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    cycles.push(cycle);
                }
            }
            Mark::Unvisited => visit(next, edges, marks, path, cycles),
            Mark::Done => {}
        }
    }

    path.pop();
    marks[node] = Mark::Done;
}
