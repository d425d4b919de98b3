//! Retry, backoff and cancellation for external reads

mod cancel;
mod executor;
mod sleeper;

pub use cancel::CancelToken;
pub use executor::{RetryExecutor, RetryPolicy, MAX_DELAY};
pub use sleeper::{RecordingSleeper, Sleeper, ThreadSleeper};
