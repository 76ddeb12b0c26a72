//! Deferred re-invocation of contended leaderboard updates.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    runtime::{Handle, TryCurrentError},
    time::sleep,
};
use tracing::warn;

/// Work to run once the retry delay has elapsed.
pub type RetryTask = Box<dyn FnOnce() + Send + 'static>;

/// Bound on how often, and how far apart, a contended update is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed delay before each retry.
    pub delay: Duration,
    /// Total attempts, the first one included. Values below one act as one.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay between attempts unless configured otherwise.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);
    /// Attempt bound unless configured otherwise.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

    /// Policy retrying every `delay`, `max_attempts` times in total.
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Runs a task after a delay without blocking the caller.
pub trait RetryScheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: RetryTask);
}

/// Scheduler backed by a tokio runtime timer.
///
/// The task itself touches the synchronous backend, so it runs on the
/// blocking pool once the delay has elapsed.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Scheduler spawning onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime the caller is running on.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl RetryScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: RetryTask) {
        self.handle.spawn(async move {
            sleep(delay).await;
            if let Err(err) = tokio::task::spawn_blocking(task).await {
                warn!(error = %err, "scheduled leaderboard retry did not complete");
            }
        });
    }
}

/// Scheduler that queues tasks until the owner fires them.
///
/// Delays are recorded but not waited on, which lets callers drive retries
/// deterministically, one round at a time.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<(Duration, RetryTask)>>,
}

impl ManualScheduler {
    /// Scheduler with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.lock_queue().len()
    }

    /// Delays requested by the waiting tasks, in scheduling order.
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.lock_queue().iter().map(|(delay, _)| *delay).collect()
    }

    /// Run the tasks queued so far. Tasks they schedule wait for the next round.
    /// Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let due: Vec<_> = self.lock_queue().drain(..).collect();
        let count = due.len();
        for (_, task) in due {
            task();
        }
        count
    }

    /// Run rounds until the queue is empty or `max_rounds` is reached.
    /// Returns how many tasks ran in total.
    pub fn run_until_idle(&self, max_rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_rounds {
            let ran = self.run_pending();
            if ran == 0 {
                break;
            }
            total += ran;
        }
        total
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<(Duration, RetryTask)>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RetryScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: RetryTask) {
        self.lock_queue().push_back((delay, task));
    }
}
