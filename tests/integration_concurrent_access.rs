/// Concurrent access integration tests
///
/// These tests verify that the container behaves correctly under concurrent
/// access: singletons are built once, transients stay independent, and
/// shutdown runs exactly once.

use ferrous_ioc::{Container, ContainerBuilder, Definition, DependencyRequest, DiError};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread;
use std::time::Duration;

// ===== Test Components =====

#[derive(Debug)]
pub struct CounterService {
    count: AtomicU32,
}

impl CounterService {
    pub fn new() -> Self {
        Self { count: AtomicU32::new(0) }
    }

    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get_count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct SlowSingleton {
    serial: usize,
}

pub struct Dependent {
    slow: Arc<SlowSingleton>,
}

fn slow_container(constructions: Arc<AtomicUsize>) -> Container {
    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::factory("slow", move || {
                // Widen the race window
                thread::sleep(Duration::from_millis(20));
                Ok(SlowSingleton {
                    serial: constructions.fetch_add(1, Ordering::SeqCst),
                })
            })
            .capability("Slow")
            .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::constructor("dependent", [DependencyRequest::single("Slow")], |args| {
                Ok(Dependent {
                    slow: args.arc::<SlowSingleton>(0)?,
                })
            })
            .transient()
            .build(),
        )
        .unwrap();
    builder.build().unwrap()
}

// ===== Integration Tests =====

#[test]
fn test_singleton_constructed_once_under_contention() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let container = slow_container(constructions.clone());
    let thread_count = 8;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|i| {
            let container = container.clone();
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    container.get_as::<SlowSingleton>("slow").unwrap()
                } else {
                    container.get_as::<Dependent>("dependent").unwrap().slow.clone()
                }
            })
        })
        .collect();

    let results: Vec<Arc<SlowSingleton>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for slow in &results {
        assert!(Arc::ptr_eq(slow, &results[0]));
        assert_eq!(slow.serial, 0);
    }
}

#[test]
fn test_singleton_thread_safety() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(Definition::factory("counter", || Ok(CounterService::new())).build())
        .unwrap();

    let container = builder.build().unwrap();
    let thread_count = 8;
    let operations_per_thread = 100;

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..thread_count {
            s.spawn(|_| {
                let counter = container.get_as::<CounterService>("counter").unwrap();
                for _ in 0..operations_per_thread {
                    counter.increment();
                }
            });
        }
    })
    .unwrap();

    let counter = container.get_as::<CounterService>("counter").unwrap();
    assert_eq!(counter.get_count(), (thread_count * operations_per_thread) as u32);
}

#[test]
fn test_transients_are_independent_across_threads() {
    let created = Arc::new(AtomicUsize::new(0));
    let created_clone = created.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::factory("request", move || Ok(created_clone.fetch_add(1, Ordering::SeqCst)))
                .transient()
                .build(),
        )
        .unwrap();

    let container = builder.build().unwrap();
    let ids = Mutex::new(Vec::new());

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                for _ in 0..25 {
                    let id = container.get_as::<usize>("request").unwrap();
                    ids.lock().unwrap().push(*id);
                }
            });
        }
    })
    .unwrap();

    let mut ids = ids.into_inner().unwrap();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    assert_eq!(created.load(Ordering::SeqCst), 100);
}

#[test]
fn test_concurrent_shutdown_runs_destroy_hooks_once() {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let destroyed_clone = destroyed.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::factory("resource", || Ok(CounterService::new()))
                .destroy(move |_| {
                    destroyed_clone.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
        )
        .unwrap();

    let container = builder.build().unwrap();
    container.get("resource").unwrap();

    let thread_count = 6;
    let barrier = Barrier::new(thread_count);
    crossbeam_utils::thread::scope(|s| {
        for _ in 0..thread_count {
            s.spawn(|_| {
                barrier.wait();
                container.shutdown().unwrap();
            });
        }
    })
    .unwrap();

    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert!(matches!(container.get("resource"), Err(DiError::ContainerClosed)));
}

#[test]
fn test_failed_singleton_is_retried_by_other_threads() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::factory("fragile", move || {
                if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("first attempt fails".into())
                } else {
                    Ok(CounterService::new())
                }
            })
            .build(),
        )
        .unwrap();

    let container = builder.build().unwrap();
    assert!(container.get("fragile").is_err());

    let results = Mutex::new(Vec::new());
    crossbeam_utils::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                let instance = container.get("fragile").unwrap();
                results.lock().unwrap().push(instance);
            });
        }
    })
    .unwrap();

    let results = results.into_inner().unwrap();
    assert!(results.iter().all(|i| i.ptr_eq(&results[0])));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

/// Both factories wait, bounded, until the other has started too.
struct Rendezvous {
    inside: Mutex<usize>,
    arrived: Condvar,
}

impl Rendezvous {
    fn enter(&self) -> bool {
        let mut inside = self.inside.lock().unwrap();
        *inside += 1;
        self.arrived.notify_all();
        let (inside, timeout) = self
            .arrived
            .wait_timeout_while(inside, Duration::from_secs(5), |n| *n < 2)
            .unwrap();
        drop(inside);
        !timeout.timed_out()
    }
}

#[test]
fn test_unrelated_singletons_build_in_parallel() {
    let rendezvous = Arc::new(Rendezvous {
        inside: Mutex::new(0),
        arrived: Condvar::new(),
    });

    let mut builder = ContainerBuilder::new();
    for name in ["left", "right"] {
        let rendezvous = rendezvous.clone();
        builder
            .register(Definition::factory(name, move || Ok(rendezvous.enter())).build())
            .unwrap();
    }
    let container = builder.build().unwrap();

    let (left, right) = thread::scope(|s| {
        let left = s.spawn(|| container.get_as::<bool>("left").unwrap());
        let right = s.spawn(|| container.get_as::<bool>("right").unwrap());
        (left.join().unwrap(), right.join().unwrap())
    });

    // Each build saw the other one in progress
    assert!(*left);
    assert!(*right);
}

#[test]
fn test_factory_can_delegate_lookup_to_another_thread() {
    let handle: Arc<Mutex<Option<Container>>> = Arc::new(Mutex::new(None));
    let handle_clone = handle.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register(Definition::factory("leaf", || Ok(7u32)).build())
        .unwrap();
    builder
        .register(
            Definition::factory("outer", move || {
                let container = handle_clone.lock().unwrap().clone().ok_or("container not installed")?;
                let leaf = thread::spawn(move || container.get_as::<u32>("leaf"))
                    .join()
                    .map_err(|_| "helper thread panicked")??;
                Ok(*leaf * 6)
            })
            .build(),
        )
        .unwrap();

    let container = builder.build().unwrap();
    *handle.lock().unwrap() = Some(container.clone());

    assert_eq!(*container.get_as::<u32>("outer").unwrap(), 42);
    // Break the container -> factory -> container cycle
    handle.lock().unwrap().take();
}

#[test]
fn test_cyclic_singletons_fail_on_both_threads_without_hanging() {
    let mut builder = ContainerBuilder::new();
    builder
        .register(
            Definition::constructor("ping", [DependencyRequest::single("Pong")], |_| Ok(()))
                .capability("Ping")
                .build(),
        )
        .unwrap();
    builder
        .register(
            Definition::constructor("pong", [DependencyRequest::single("Ping")], |_| Ok(()))
                .capability("Pong")
                .build(),
        )
        .unwrap();
    let container = builder.build().unwrap();
    let barrier = Barrier::new(2);

    let results = thread::scope(|s| {
        let ping = s.spawn(|| {
            barrier.wait();
            container.get("ping").map(|_| ())
        });
        let pong = s.spawn(|| {
            barrier.wait();
            container.get("pong").map(|_| ())
        });
        [ping.join().unwrap(), pong.join().unwrap()]
    });

    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err.root(), DiError::Circular(path) if path.len() >= 3));
    }
}
