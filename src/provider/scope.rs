//! Singleton scope: per-definition instance slots, build ownership, lifecycle
//! states, and the destruction list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex, ReentrantMutex};

use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::instance::{AnyArc, Instance};
use crate::internal::DestructionList;
use crate::lifecycle::LifecycleState;
use crate::observer::Observers;

/// Which thread is building which slot, and which slot each blocked thread
/// waits for.
struct Builds {
    owners: Vec<Option<ThreadId>>,
    waiting: AHashMap<ThreadId, usize>,
}

impl Builds {
    fn any_owned_by_others(&self, me: ThreadId) -> bool {
        self.owners.iter().any(|owner| matches!(owner, Some(t) if *t != me))
    }

    /// Slots that close a wait cycle if `me` blocks on `slot`, which `owner`
    /// is building. The last slot is one `me` owns.
    fn wait_cycle(&self, me: ThreadId, owner: ThreadId, slot: usize) -> Option<Vec<usize>> {
        let mut path = vec![slot];
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            let wanted = *self.waiting.get(&current)?;
            path.push(wanted);
            match self.owners[wanted]? {
                next if next == me => return Some(path),
                next => current = next,
            }
        }
        None
    }
}

/// Result of [`SingletonScope::claim`].
pub(crate) enum Claim<'a> {
    Ready(Instance),
    /// The caller builds the slot; dropping the guard releases it.
    Build(BuildGuard<'a>),
    /// The calling thread is already building this slot.
    Reentered,
    /// Blocking would deadlock against other builders; slots in wait order.
    Deadlock(Vec<usize>),
}

/// Ownership of one in-flight singleton build.
///
/// Dropped without [`publish`](Self::publish), the slot's state is cleared so
/// a later request retries from scratch.
pub(crate) struct BuildGuard<'a> {
    scope: &'a SingletonScope,
    slot: usize,
}

impl BuildGuard<'_> {
    pub(crate) fn publish(self, instance: Instance) -> Instance {
        self.scope.slots[self.slot].get_or_init(|| instance).clone()
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.scope.slots[self.slot].get().is_none() {
            self.scope.states.lock()[self.slot] = None;
        }
        self.scope.builds.lock().owners[self.slot] = None;
        self.scope.finished.notify_all();
    }
}

/// Cache and owner of singleton instances.
///
/// Reads of a published singleton are lock-free. Each slot is built by at
/// most one thread at a time; other threads asking for that slot block until
/// the build finishes, while unrelated slots build in parallel.
pub(crate) struct SingletonScope {
    slots: Box<[OnceCell<Instance>]>,
    states: Mutex<Vec<Option<LifecycleState>>>,
    builds: Mutex<Builds>,
    finished: Condvar,
    sweep: ReentrantMutex<()>,
    destruction: Mutex<DestructionList>,
    closed: AtomicBool,
}

impl SingletonScope {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceCell::new()).collect::<Vec<_>>().into_boxed_slice(),
            states: Mutex::new(vec![None; len]),
            builds: Mutex::new(Builds {
                owners: vec![None; len],
                waiting: AHashMap::new(),
            }),
            finished: Condvar::new(),
            sweep: ReentrantMutex::new(()),
            destruction: Mutex::new(DestructionList::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Published instance for `slot`, if any.
    #[inline]
    pub(crate) fn get(&self, slot: usize) -> Option<Instance> {
        self.slots[slot].get().cloned()
    }

    /// Published instance for `slot`, or the right to build it.
    ///
    /// Blocks while another thread builds the slot, unless waiting would
    /// close a cycle of builders.
    pub(crate) fn claim(&self, slot: usize) -> DiResult<Claim<'_>> {
        let me = thread::current().id();
        let mut builds = self.builds.lock();
        loop {
            if self.is_closed() {
                return Err(DiError::ContainerClosed);
            }
            if let Some(instance) = self.get(slot) {
                return Ok(Claim::Ready(instance));
            }
            let owner = builds.owners[slot];
            match owner {
                None => {
                    builds.owners[slot] = Some(me);
                    return Ok(Claim::Build(BuildGuard { scope: self, slot }));
                }
                Some(owner) if owner == me => return Ok(Claim::Reentered),
                Some(owner) => {
                    if let Some(cycle) = builds.wait_cycle(me, owner, slot) {
                        return Ok(Claim::Deadlock(cycle));
                    }
                    builds.waiting.insert(me, slot);
                    self.finished.wait(&mut builds);
                    builds.waiting.remove(&me);
                }
            }
        }
    }

    pub(crate) fn set_state(&self, slot: usize, state: LifecycleState) {
        self.states.lock()[slot] = Some(state);
    }

    pub(crate) fn state(&self, slot: usize) -> Option<LifecycleState> {
        self.states.lock().get(slot).copied().flatten()
    }

    /// Records a fully initialized singleton for destruction at shutdown.
    pub(crate) fn completed(&self, value: AnyArc, definition: Arc<Definition>) {
        self.destruction.lock().push(value, definition);
    }

    /// Number of singletons awaiting destruction
    pub(crate) fn live_count(&self) -> usize {
        self.destruction.lock().len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the scope and destroys every completed singleton in reverse
    /// completion order.
    ///
    /// Waits for builds in flight on other threads. Only the first call does
    /// any work; concurrent callers return once it is done.
    pub(crate) fn shutdown(&self, slot_of: impl Fn(&str) -> Option<usize>, observers: &Observers) -> DiResult<()> {
        let _sweep = self.sweep.lock();
        {
            let mut builds = self.builds.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                tracing::debug!("shutdown already performed");
                return Ok(());
            }
            let me = thread::current().id();
            while builds.any_owned_by_others(me) {
                tracing::debug!("waiting for in-flight singleton builds");
                self.finished.wait(&mut builds);
            }
        }

        let mut list = std::mem::take(&mut *self.destruction.lock());
        tracing::debug!(singletons = list.len(), "shutting down");
        let failures = list.run_all_reverse(|definition, clean| {
            if let Some(slot) = slot_of(definition.name()) {
                self.set_state(slot, LifecycleState::Destroyed);
            }
            observers.destroyed(definition.name(), clean);
        });

        if failures.is_empty() {
            tracing::info!("shutdown complete");
            Ok(())
        } else {
            tracing::warn!(failures = failures.len(), "shutdown completed with destroy failures");
            Err(DiError::Shutdown(failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_cycle_follows_waiting_builders() {
        let main = thread::current().id();
        let other = thread::spawn(|| thread::current().id()).join().unwrap();

        let mut builds = Builds {
            owners: vec![Some(main), Some(other)],
            waiting: AHashMap::new(),
        };
        // `other` is not waiting yet
        assert_eq!(builds.wait_cycle(main, other, 1), None);

        builds.waiting.insert(other, 0);
        assert_eq!(builds.wait_cycle(main, other, 1), Some(vec![1, 0]));
        assert!(builds.any_owned_by_others(main));
    }

    #[test]
    fn abandoned_build_releases_the_slot() {
        let scope = SingletonScope::new(1);
        match scope.claim(0).unwrap() {
            Claim::Build(guard) => {
                scope.set_state(0, LifecycleState::Constructed);
                assert!(matches!(scope.claim(0).unwrap(), Claim::Reentered));
                drop(guard);
            }
            _ => panic!("expected to own the build"),
        }
        assert_eq!(scope.state(0), None);
        assert!(matches!(scope.claim(0).unwrap(), Claim::Build(_)));
    }
}
