//! Retry with exponential backoff
//!
//! Every external read in the pipeline (catalog search, band reads) runs
//! through one `RetryExecutor`, so there is a single retry policy.

use std::time::Duration;

use crate::errors::PipelineResult;
use crate::utils::logger::Logger;
use super::cancel::CancelToken;
use super::sleeper::Sleeper;

/// Longest single backoff sleep
pub const MAX_DELAY: Duration = Duration::from_secs(300);

/// Attempt limit and backoff base
///
/// The sleep after failed attempt `n` (1-based) is `backoff_base^(n-1)`
/// seconds, capped at `MAX_DELAY`; there is no sleep after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 3, backoff_base: 2.0 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: f64) -> Self {
        RetryPolicy { max_attempts, backoff_base }
    }

    /// Same backoff with a different attempt limit
    pub fn with_attempts(self, max_attempts: u32) -> Self {
        RetryPolicy { max_attempts, ..self }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let seconds = self.backoff_base.powi(exponent);
        if seconds.is_nan() || seconds <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(seconds).map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }
}

/// Runs fallible operations under a retry policy
pub struct RetryExecutor<'a> {
    policy: RetryPolicy,
    sleeper: &'a dyn Sleeper,
    cancel: CancelToken,
    logger: &'a Logger,
}

impl<'a> RetryExecutor<'a> {
    /// Create a new executor
    ///
    /// # Arguments
    /// * `policy` - Default attempt limit and backoff
    /// * `sleeper` - Clock used for backoff
    /// * `cancel` - Token of the invocation; checked before every attempt
    /// * `logger` - Receives one record per failed attempt
    pub fn new(policy: RetryPolicy, sleeper: &'a dyn Sleeper, cancel: CancelToken, logger: &'a Logger) -> Self {
        RetryExecutor { policy, sleeper, cancel, logger }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Runs `operation` with the default policy
    pub fn run<T, F>(&self, label: &str, operation: F) -> PipelineResult<T>
    where
        F: FnMut() -> PipelineResult<T>,
    {
        self.run_with(self.policy, label, operation)
    }

    /// Runs `operation` until it succeeds or the attempts are exhausted
    ///
    /// Failures are logged as warnings with the attempt index and cause; the
    /// last failure is logged as an error and returned. Cancellation and
    /// deadline errors stop the loop at once, whether they come from the
    /// token or from the operation itself.
    pub fn run_with<T, F>(&self, policy: RetryPolicy, label: &str, mut operation: F) -> PipelineResult<T>
    where
        F: FnMut() -> PipelineResult<T>,
    {
        let max_attempts = policy.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            self.cancel.check()?;

            let error = match operation() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_terminal() => return Err(error),
                Err(error) => error,
            };

            if attempt >= max_attempts {
                self.logger.error(&format!("{}: attempt {}/{} failed ({}), giving up", label, attempt, max_attempts, error));
                return Err(error);
            }

            let delay = policy.delay(attempt);
            self.logger.warn(&format!(
                "{}: attempt {}/{} failed ({}), retrying in {:.0}s",
                label, attempt, max_attempts, error, delay.as_secs_f64()
            ));
            self.sleeper.sleep(delay, &self.cancel)?;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::retry::sleeper::RecordingSleeper;
    use log::Level;

    fn flaky(failures: u32) -> impl FnMut() -> PipelineResult<&'static str> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= failures {
                Err(PipelineError::ExternalRead(format!("timeout #{}", calls)))
            } else {
                Ok("scene")
            }
        }
    }

    #[test]
    fn test_success_after_two_failures() {
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let executor = RetryExecutor::new(RetryPolicy::default(), &sleeper, CancelToken::new(), &logger);

        assert_eq!(executor.run("search", flaky(2)).unwrap(), "scene");
        assert_eq!(sleeper.requested(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(logger.messages_at(Level::Warn).len(), 2);
        assert!(logger.messages_at(Level::Error).is_empty());
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let policy = RetryPolicy::new(4, 3.0);
        let executor = RetryExecutor::new(policy, &sleeper, CancelToken::new(), &logger);

        let err = executor.run("read", flaky(10)).unwrap_err();
        assert_eq!(err.to_string(), "External read failed: timeout #4");
        // max_attempts - 1 sleeps of base^0, base^1, base^2
        assert_eq!(sleeper.requested(), vec![
            Duration::from_secs(1), Duration::from_secs(3), Duration::from_secs(9),
        ]);
        let warnings = logger.messages_at(Level::Warn);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("attempt 1/4 failed (External read failed: timeout #1)"));
        assert_eq!(logger.messages_at(Level::Error).len(), 1);
    }

    #[test]
    fn test_huge_backoff_is_capped() {
        assert_eq!(RetryPolicy::new(3, 1e20).delay(2), MAX_DELAY);
        assert_eq!(RetryPolicy::new(3, 1e20).delay(1), Duration::from_secs(1));
        assert_eq!(RetryPolicy::new(400, 2.0).delay(400), MAX_DELAY);
        assert_eq!(RetryPolicy::new(3, f64::NAN).delay(2), Duration::ZERO);
    }

    #[test]
    fn test_first_success_does_not_sleep() {
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let executor = RetryExecutor::new(RetryPolicy::default(), &sleeper, CancelToken::new(), &logger);

        assert!(executor.run("search", flaky(0)).is_ok());
        assert!(sleeper.requested().is_empty());
        assert!(logger.entries().is_empty());
    }

    #[test]
    fn test_terminal_errors_are_not_retried() {
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let executor = RetryExecutor::new(RetryPolicy::default(), &sleeper, CancelToken::new(), &logger);

        let mut calls = 0;
        let result: PipelineResult<()> = executor.run("read", || {
            calls += 1;
            Err(PipelineError::DeadlineExceeded)
        });
        assert!(matches!(result, Err(PipelineError::DeadlineExceeded)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_cancelled_token_stops_before_first_attempt() {
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let executor = RetryExecutor::new(RetryPolicy::default(), &sleeper, cancel, &logger);

        let mut calls = 0;
        let result = executor.run("search", || {
            calls += 1;
            Ok(())
        });
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_policy_override_limits_attempts() {
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let executor = RetryExecutor::new(RetryPolicy::default(), &sleeper, CancelToken::new(), &logger);

        let policy = executor.policy().with_attempts(2);
        assert!(executor.run_with(policy, "worldcover", flaky(5)).is_err());
        assert_eq!(sleeper.requested(), vec![Duration::from_secs(1)]);
    }
}
