//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: Async test utilities and helpers
//!
//! All helpers measure time with `tokio::time`, so they also work inside
//! tests that run on a paused clock (`#[tokio::test(start_paused = true)]`).

pub mod async_utils;

// Note: `assert_eventually_async!` is exported at the crate root
pub use async_utils::{poll_until, timeout_ok};
