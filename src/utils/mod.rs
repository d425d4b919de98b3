//! Utility modules for common functionality
//!
//! Logging and progress reporting shared by the pipeline stages.

pub mod logger;
pub mod progress;
