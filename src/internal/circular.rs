//! Circular dependency detection infrastructure.

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};

/// Default bound on nested construction depth
pub(crate) const MAX_DEPTH: usize = 128;

/// Names of the components under construction for one top-level request,
/// outermost first.
///
/// Passed explicitly through the build recursion, so concurrent requests on
/// different threads never observe each other's stacks.
pub(crate) struct ConstructionStack {
    names: SmallVec<[String; 8]>,
    max_depth: usize,
}

impl ConstructionStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            names: SmallVec::new(),
            max_depth,
        }
    }

    /// Runs `f` with `name` pushed on the stack.
    ///
    /// Fails with [`DiError::Circular`] when `name` is already being built (the
    /// path ends with the repeated name) and with [`DiError::DepthExceeded`]
    /// past the depth bound. The name is popped whether `f` succeeds or fails.
    pub(crate) fn within<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> DiResult<T>) -> DiResult<T> {
        if self.contains(name) {
            return Err(DiError::Circular(self.path_through([name])));
        }
        if self.names.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.max_depth));
        }

        self.names.push(name.to_string());
        let result = f(self);
        let popped = self.names.pop();
        debug_assert_eq!(popped.as_deref(), Some(name));
        result
    }

    /// The current path followed by `tail`.
    pub(crate) fn path_through<'n>(&self, tail: impl IntoIterator<Item = &'n str>) -> Vec<String> {
        self.names
            .iter()
            .cloned()
            .chain(tail.into_iter().map(str::to_string))
            .collect()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub(crate) fn depth(&self) -> usize {
        self.names.len()
    }
}
