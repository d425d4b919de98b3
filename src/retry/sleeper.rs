//! Backoff sleep strategies

use std::sync::Mutex;
use std::time::Duration;

use crate::errors::PipelineResult;
use super::cancel::CancelToken;

/// Clock capability used between retry attempts
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`, returning early with an error when `cancel` fires
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> PipelineResult<()>;
}

/// Real-time sleeper, interruptible through the cancel token
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> PipelineResult<()> {
        cancel.wait(duration)
    }
}

/// Sleeper that returns immediately and remembers what it was asked for
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    requested: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in call order
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> PipelineResult<()> {
        cancel.check()?;
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(duration);
        }
        Ok(())
    }
}
