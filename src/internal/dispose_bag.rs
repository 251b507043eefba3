//! Internal destruction list for container-owned singletons.

use std::sync::Arc;

use crate::definition::Definition;
use crate::error::DestroyFailure;
use crate::instance::AnyArc;

/// Singletons in completion order, destroyed in reverse (LIFO).
///
/// A singleton is recorded only after its init hooks succeed, so every
/// dependency completes (and is recorded) before its dependents.
#[derive(Default)]
pub(crate) struct DestructionList {
    entries: Vec<(AnyArc, Arc<Definition>)>,
}

impl DestructionList {
    pub(crate) fn push(&mut self, value: AnyArc, definition: Arc<Definition>) {
        self.entries.push((value, definition));
    }

    /// Runs every destroy hook in reverse completion order.
    ///
    /// A failing hook does not stop the sweep; `on_destroyed` is told about
    /// each component once its hooks have run, and failures are returned in
    /// sweep order. The list is empty afterwards.
    pub(crate) fn run_all_reverse(&mut self, mut on_destroyed: impl FnMut(&Definition, bool)) -> Vec<DestroyFailure> {
        let mut failures = Vec::new();
        while let Some((value, definition)) = self.entries.pop() {
            let mut ok = true;
            for hook in definition.destroy_hooks() {
                if let Err(source) = hook(&*value) {
                    tracing::warn!(name = definition.name(), error = %source, "destroy hook failed");
                    failures.push(DestroyFailure {
                        name: definition.name().to_string(),
                        source,
                    });
                    ok = false;
                }
            }
            on_destroyed(&definition, ok);
        }
        failures
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
