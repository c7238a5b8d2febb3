//! Common utilities shared across TerraSync crates.
//!
//! Currently this is the generic retry/backoff executor that shields
//! remote operations from transient failure. It is deliberately free of
//! domain types: callers bring their own error type and classify it
//! through [`retry::RetryClass`].

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod retry;

pub use retry::{run_with_retry, RetryClass, RetryError, RetryPolicy};
