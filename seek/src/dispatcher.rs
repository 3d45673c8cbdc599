//! Fixed-size worker pool for index lookups.
//!
//! The resolver hands the exact-match lookup to a pool worker and runs the
//! partial-match lookup on its own thread. Workers may run at a raised
//! priority so lookups are not starved by interactive work on the caller.

use crate::config::{DispatcherConfig, WorkerPriority};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

pub struct TaskDispatcher {
    pool: ThreadPool,
}

impl TaskDispatcher {
    pub fn new(config: &DispatcherConfig) -> Result<Self, ThreadPoolBuildError> {
        let priority = config.priority;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .thread_name(|i| format!("seek-lookup-{}", i))
            .start_handler(move |i| apply_priority(i, priority))
            .build()?;

        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `remote` on a pool worker while `local` runs on the calling thread.
    ///
    /// Returns once both have finished. The remote slot is `None` only if the
    /// worker never produced a value.
    pub fn join<A, RA, B, RB>(&self, remote: A, local: B) -> (Option<RA>, RB)
    where
        A: FnOnce() -> RA + Send,
        RA: Send,
        B: FnOnce() -> RB,
    {
        let mut remote_result = None;
        let slot = &mut remote_result;

        let local_result = self.pool.in_place_scope(move |scope| {
            scope.spawn(move |_| *slot = Some(remote()));
            local()
        });

        (remote_result, local_result)
    }
}

fn apply_priority(worker: usize, priority: WorkerPriority) {
    use thread_priority::*;

    let requested = match priority {
        WorkerPriority::Normal => return,
        WorkerPriority::Min => ThreadPriority::Min,
        WorkerPriority::Max => ThreadPriority::Max,
    };

    // Raising priority usually needs privileges; lookups still work without it
    if let Err(e) = set_current_thread_priority(requested) {
        tracing::debug!(worker, ?priority, error = ?e, "could not change lookup worker priority");
    }
}
