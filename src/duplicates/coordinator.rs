//! Worker pool and task barrier.
//!
//! # Overview
//!
//! Both detection phases fan out work whose shape is only discovered while
//! running: directory listings reveal subdirectories, and every comparison
//! step may split a group into several sub-groups. [`TaskCoordinator`] runs
//! such work on a bounded rayon pool. A run starts from one seed task; any
//! task may [`submit`](Spawner::submit) further tasks, and
//! [`run`](TaskCoordinator::run) returns only after every transitively
//! submitted task has finished.
//!
//! A task that returns an error or panics aborts the run. Tasks submitted
//! after the abort are dropped without running, which releases whatever
//! they own through `Drop`. The first failure is returned to the caller.
//!
//! # Example
//!
//! ```
//! use bytedupe::duplicates::TaskCoordinator;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! fn count_down<'s>(n: usize, seen: &'s AtomicUsize, spawner: &bytedupe::duplicates::Spawner<'_, 's>) {
//!     seen.fetch_add(1, Ordering::Relaxed);
//!     if n > 0 {
//!         spawner.submit(move |s| {
//!             count_down(n - 1, seen, s);
//!             Ok(())
//!         });
//!     }
//! }
//!
//! let coordinator = TaskCoordinator::new(2).unwrap();
//! let seen = AtomicUsize::new(0);
//! let stats = coordinator
//!     .run(|s| {
//!         count_down(9, &seen, s);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(seen.load(Ordering::Relaxed), 10);
//! assert_eq!(stats.submitted, stats.completed);
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::finder::FinderError;

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Tasks accepted by the coordinator.
    pub submitted: usize,
    /// Accepted tasks that have finished, whether they ran or were skipped.
    pub completed: usize,
    /// Tasks dropped without running because the run was aborted.
    pub skipped: usize,
}

struct Barrier {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    aborted: AtomicBool,
    failure: Mutex<Option<FinderError>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Barrier {
    fn new(shutdown_flag: Option<Arc<AtomicBool>>) -> Self {
        Self {
            submitted: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
            shutdown_flag,
        }
    }

    /// Record `error` as the run's failure unless one is already recorded.
    fn fail(&self, error: FinderError) {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            log::debug!("Aborting run: {}", error);
            *failure = Some(error);
        }
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn is_aborted(&self) -> bool {
        if self.aborted.load(Ordering::SeqCst) {
            return true;
        }
        if self
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
        {
            self.fail(FinderError::Interrupted);
            return true;
        }
        false
    }

    fn stats(&self) -> TaskStats {
        TaskStats {
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
        }
    }

    fn take_failure(&self) -> Option<FinderError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker task panicked".to_string()
    }
}

/// Submission handle passed to every running task.
pub struct Spawner<'a, 'scope> {
    scope: &'a rayon::Scope<'scope>,
    barrier: &'a Arc<Barrier>,
}

impl<'scope> Spawner<'_, 'scope> {
    /// Submit a task to run on the pool.
    ///
    /// If the run has already been aborted (by a failed task or by the
    /// shutdown flag) the task is dropped immediately instead.
    pub fn submit<F>(&self, task: F)
    where
        F: for<'b> FnOnce(&Spawner<'b, 'scope>) -> Result<(), FinderError> + Send + 'scope,
    {
        if self.barrier.is_aborted() {
            self.barrier.skipped.fetch_add(1, Ordering::SeqCst);
            drop(task);
            return;
        }

        self.barrier.submitted.fetch_add(1, Ordering::SeqCst);
        let barrier = Arc::clone(self.barrier);
        self.scope.spawn(move |scope| {
            if barrier.is_aborted() {
                barrier.skipped.fetch_add(1, Ordering::SeqCst);
                drop(task);
            } else {
                let spawner = Spawner {
                    scope,
                    barrier: &barrier,
                };
                match panic::catch_unwind(AssertUnwindSafe(|| task(&spawner))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => barrier.fail(e),
                    Err(payload) => {
                        barrier.fail(FinderError::TaskFailed(panic_message(payload.as_ref())))
                    }
                }
            }
            barrier.completed.fetch_add(1, Ordering::SeqCst);
        });
    }

    /// Check if the run has been aborted and no further work should start.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.barrier.is_aborted()
    }
}

/// Shared worker pool that awaits a dynamically growing set of tasks.
pub struct TaskCoordinator {
    pool: rayon::ThreadPool,
    threads: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl TaskCoordinator {
    /// Create a coordinator backed by a pool of `threads` workers (minimum 1).
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the pool cannot be created.
    pub fn new(threads: usize) -> Result<Self, FinderError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("bytedupe-worker-{}", i))
            .build()?;
        Ok(Self {
            pool,
            threads,
            shutdown_flag: None,
        })
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Every task checks the flag before it starts; once it is set the run
    /// ends with [`FinderError::Interrupted`].
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `seed` and every task it transitively submits, then return.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by any task, a
    /// [`FinderError::TaskFailed`] if a task panicked, or
    /// [`FinderError::Interrupted`] if the shutdown flag was raised.
    pub fn run<'scope, F>(&self, seed: F) -> Result<TaskStats, FinderError>
    where
        F: for<'b> FnOnce(&Spawner<'b, 'scope>) -> Result<(), FinderError> + Send + 'scope,
    {
        let barrier = Arc::new(Barrier::new(self.shutdown_flag.clone()));

        // The scope only returns once every spawned task, including tasks
        // spawned by other tasks, has finished.
        self.pool.scope(|scope| {
            let spawner = Spawner {
                scope,
                barrier: &barrier,
            };
            spawner.submit(seed);
        });

        let stats = barrier.stats();
        debug_assert_eq!(stats.submitted, stats.completed);
        log::trace!(
            "Task barrier drained: {} submitted, {} skipped",
            stats.submitted,
            stats.skipped
        );

        match barrier.take_failure() {
            Some(error) => Err(error),
            None => Ok(stats),
        }
    }
}

impl std::fmt::Debug for TaskCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskCoordinator")
            .field("threads", &self.threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .finish()
    }
}
