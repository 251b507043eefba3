//! Candidate selection for dependency requests.
//!
//! Pure functions over the registry: they decide *which* definitions satisfy
//! a request without building anything, so static validation and runtime
//! resolution share one set of rules.

use crate::error::{DiError, DiResult};
use crate::registry::{Candidates, DefinitionRegistry};
use crate::request::{DependencyRequest, Multiplicity};

/// Outcome of candidate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    /// Exactly one definition slot
    One(usize),
    /// Optional single request with no candidate
    Absent,
    /// Every candidate slot in registration order (possibly empty)
    All(Candidates),
}

/// Chooses the definition(s) satisfying `request`.
///
/// Rules, in order:
/// 1. Collections take every candidate; the qualifier is ignored and an empty
///    result is valid.
/// 2. A qualifier keeps only the candidate whose name or alias equals it.
/// 3. A single candidate is chosen.
/// 4. Several candidates are resolved by a unique primary marker, otherwise the
///    request is ambiguous.
/// 5. No candidate is absent for optional requests and unsatisfied otherwise.
pub(crate) fn select(registry: &DefinitionRegistry, request: &DependencyRequest, site: &str) -> DiResult<Selection> {
    let candidates = registry.candidates(&request.capability);

    if request.multiplicity == Multiplicity::Collection {
        return Ok(Selection::All(candidates.iter().copied().collect()));
    }

    if let Some(qualifier) = &request.qualifier {
        let qualified = candidates
            .iter()
            .copied()
            .find(|&slot| registry.at(slot).answers_to(qualifier));
        return match qualified {
            Some(slot) => Ok(Selection::One(slot)),
            None => missing(request, site),
        };
    }

    match candidates {
        [] => missing(request, site),
        [only] => Ok(Selection::One(*only)),
        many => {
            let primaries: Candidates = many
                .iter()
                .copied()
                .filter(|&slot| registry.at(slot).is_primary())
                .collect();
            match primaries.as_slice() {
                [primary] => Ok(Selection::One(*primary)),
                [] => Err(ambiguous(registry, request, site, many)),
                contested => Err(ambiguous(registry, request, site, contested)),
            }
        }
    }
}

fn missing(request: &DependencyRequest, site: &str) -> DiResult<Selection> {
    if request.required {
        Err(DiError::Unsatisfied {
            request: request.to_string(),
            site: site.to_string(),
        })
    } else {
        Ok(Selection::Absent)
    }
}

fn ambiguous(registry: &DefinitionRegistry, request: &DependencyRequest, site: &str, slots: &[usize]) -> DiError {
    DiError::Ambiguous {
        request: request.to_string(),
        site: site.to_string(),
        candidates: slots.iter().map(|&slot| registry.at(slot).name().to_string()).collect(),
    }
}
