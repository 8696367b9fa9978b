//! Cancellable debounce timer

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

const WAITING: u8 = 0;
const STARTED: u8 = 1;
const CANCELLED: u8 = 2;

/// Handle to one scheduled run
#[derive(Debug, Clone)]
pub struct TimerHandle {
    phase: Arc<AtomicU8>,
    abort: AbortHandle,
}

impl TimerHandle {
    /// Stop the run if it is still in its quiet period
    ///
    /// A run that has already started is left to finish. Returns whether the
    /// run was cancelled by this call.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .phase
            .compare_exchange(WAITING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if cancelled {
            self.abort.abort();
        }
        cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == CANCELLED
    }

    /// Whether the quiet period elapsed and the task began
    pub fn has_started(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == STARTED
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Runs a task a fixed delay after the latest request
///
/// A new request cancels the previous run only while it is still waiting out
/// its quiet period. Once a run has started it always completes, so its side
/// effects are never lost to a later request.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<TimerHandle>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: Mutex::new(None) }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm `task` after the quiet period, cancelling a run that is still waiting
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<Fut>(&self, task: Fut) -> TimerHandle
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let phase = Arc::new(AtomicU8::new(WAITING));
        let delay = self.delay;

        let join = tokio::spawn({
            let phase = Arc::clone(&phase);
            async move {
                tokio::time::sleep(delay).await;
                if phase
                    .compare_exchange(WAITING, STARTED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    task.await;
                }
            }
        });
        let handle = TimerHandle { phase, abort: join.abort_handle() };

        if let Some(previous) = self.pending.lock().replace(handle.clone()) {
            previous.cancel();
        }
        handle
    }

    /// Cancel the pending run if it has not started
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.cancel();
        }
    }
}
