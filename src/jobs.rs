//! The job system external collaborator: a bounded worker pool the game
//! and render threads dispatch fan-out work onto, plus a minimal default
//! implementation good enough to drive `bc_ecs::EntityStore::process*`
//! fan-out and the test suite.
//!
//! Grounded on the concurrency model's own external-interface list
//! (`add_job`, `wait`, `set_single_thread_mode`, `current_worker_index`);
//! implemented with `std::thread` plus `flume`/`parking_lot`, the same
//! concurrency crates the workspace already depends on for render-
//! resource locking, rather than pulling in an async runtime this
//! simulation core has no other use for.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fence handed back by `add_job`; `wait` blocks until every job
/// enqueued against it has run.
#[derive(Clone)]
pub struct JobFence {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

impl JobFence {
    fn new() -> Self {
        Self { inner: Arc::new((Mutex::new(0), Condvar::new())) }
    }

    fn increment(&self) {
        *self.inner.0.lock() += 1;
    }

    fn decrement_and_notify(&self) {
        let (lock, cvar) = &*self.inner;
        let mut pending = lock.lock();
        *pending -= 1;
        if *pending == 0 {
            cvar.notify_all();
        }
    }

    /// Blocks the calling thread until every job tracked by this fence
    /// has completed.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut pending = lock.lock();
        while *pending > 0 {
            cvar.wait(&mut pending);
        }
    }
}

/// The surface the simulation core consumes from its job system.
pub trait JobSystem: Send + Sync {
    /// Enqueues `job` and returns a fence that resolves once it runs.
    /// Jobs are never canceled; they always run to completion.
    fn add_job(&self, job: Job) -> JobFence;

    /// Blocks until every job tracked by `fence` has completed.
    fn wait(&self, fence: &JobFence) {
        fence.wait();
    }

    /// Forces `add_job` to run jobs inline on the calling thread instead
    /// of dispatching to the pool, for deterministic single-threaded
    /// debugging.
    fn set_single_thread_mode(&self, enabled: bool);

    /// The calling thread's worker index, or `worker_count()` if called
    /// from outside the pool (the game or render thread).
    fn current_worker_index(&self) -> usize;

    fn worker_count(&self) -> usize;
}

thread_local! {
    static WORKER_INDEX: std::cell::Cell<Option<usize>> = const { std::cell::Cell::new(None) };
}

/// `std::thread`-backed worker pool, sized `N - 2` by convention (the
/// game and render threads occupy the other two logical cores).
pub struct ThreadPoolJobSystem {
    sender: flume::Sender<Job>,
    worker_count: usize,
    single_threaded: AtomicBool,
    _workers: Vec<std::thread::JoinHandle<()>>,
}

impl ThreadPoolJobSystem {
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = flume::unbounded::<Job>();

        let workers = (0..worker_count)
            .map(|index| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("bc-job-worker-{index}"))
                    .spawn(move || {
                        WORKER_INDEX.with(|cell| cell.set(Some(index)));
                        while let Ok(job) = receiver.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn job worker thread")
            })
            .collect();

        Self { sender, worker_count, single_threaded: AtomicBool::new(false), _workers: workers }
    }

    #[must_use]
    pub fn worker_count_from_logical_cores() -> usize {
        std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4).saturating_sub(2).max(1)
    }
}

impl JobSystem for ThreadPoolJobSystem {
    fn add_job(&self, job: Job) -> JobFence {
        let fence = JobFence::new();
        fence.increment();

        if self.single_threaded.load(Ordering::Acquire) {
            job();
            fence.decrement_and_notify();
            return fence;
        }

        let done_fence = fence.clone();
        let wrapped: Job = Box::new(move || {
            job();
            done_fence.decrement_and_notify();
        });
        self.sender.send(wrapped).expect("job worker threads outlive the job system");
        fence
    }

    fn set_single_thread_mode(&self, enabled: bool) {
        self.single_threaded.store(enabled, Ordering::Release);
    }

    fn current_worker_index(&self) -> usize {
        WORKER_INDEX.with(std::cell::Cell::get).unwrap_or(self.worker_count)
    }

    fn worker_count(&self) -> usize {
        self.worker_count
    }
}

static NEXT_ROUND_ROBIN: AtomicUsize = AtomicUsize::new(0);

/// Picks a worker id for a game-thread caller that needs to tag
/// per-worker structures (dealloc queues, copy-command queues) without
/// actually running on a pool thread itself.
#[must_use]
pub fn round_robin_worker(worker_count: usize) -> usize {
    NEXT_ROUND_ROBIN.fetch_add(1, Ordering::Relaxed) % worker_count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn wait_blocks_until_the_job_has_run() {
        let pool = ThreadPoolJobSystem::new(2);
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();
        let fence = pool.add_job(Box::new(move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            flag_clone.store(true, Ordering::Release);
        }));
        fence.wait();
        assert!(flag.load(Ordering::Acquire));
    }

    #[test]
    fn single_thread_mode_runs_jobs_inline() {
        let pool = ThreadPoolJobSystem::new(2);
        pool.set_single_thread_mode(true);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let fence = pool.add_job(Box::new(move || {
            counter_clone.fetch_add(1, Ordering::Release);
        }));
        // Already ran synchronously before add_job returned.
        assert_eq!(counter.load(Ordering::Acquire), 1);
        fence.wait();
    }

    #[test]
    fn round_robin_worker_cycles_through_every_index() {
        let seen: std::collections::HashSet<usize> = (0..8).map(|_| round_robin_worker(4)).collect();
        assert_eq!(seen.len(), 4);
    }
}
