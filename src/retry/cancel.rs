//! Cooperative cancellation for a pipeline invocation
//!
//! A `CancelToken` is cloned into every stage of one invocation. Cancelling
//! it wakes any backoff sleep immediately; an optional deadline turns into
//! `DeadlineExceeded` at the next check.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::errors::{PipelineError, PipelineResult};

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

/// Shared cancellation flag with an optional deadline
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that is never cancelled unless `cancel` is called
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        CancelToken {
            state: Arc::new(CancelState::default()),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Cancels every clone of this token and wakes sleeping waiters
    pub fn cancel(&self) {
        if let Ok(mut cancelled) = self.state.cancelled.lock() {
            *cancelled = true;
        }
        self.state.wakeup.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.lock().map(|c| *c).unwrap_or(true)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails with `Cancelled` or `DeadlineExceeded` when the invocation must stop
    pub fn check(&self) -> PipelineResult<()> {
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(PipelineError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Blocks for `duration` unless cancelled or the deadline passes first
    pub fn wait(&self, duration: Duration) -> PipelineResult<()> {
        let requested_end = Instant::now() + duration;
        let end = match self.deadline {
            Some(deadline) if deadline < requested_end => deadline,
            _ => requested_end,
        };

        let mut cancelled = self.state.cancelled.lock().map_err(|_| PipelineError::Cancelled)?;
        loop {
            if *cancelled {
                return Err(PipelineError::Cancelled);
            }
            let now = Instant::now();
            if now >= end {
                break;
            }
            let (guard, _) = self.state.wakeup
                .wait_timeout(cancelled, end - now)
                .map_err(|_| PipelineError::Cancelled)?;
            cancelled = guard;
        }
        drop(cancelled);

        self.check()
    }
}
