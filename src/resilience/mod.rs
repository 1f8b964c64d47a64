//! Retry handling for calls against remote ERP systems.

mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryableError};
