//! # Resilience Module
//!
//! Fault tolerance for slow-check lookups.
//!
//! ## Architecture
//!
//! - **Backoff**: exponential, randomized retry delays bounded by a
//!   [`CheckContext`](crate::checks::CheckContext) and an attempt budget
//! - **Per-error policy**: callers decide per failure whether to retry
//!   ([`RetryDecision`]), so policies like "retry auth exactly once" live with
//!   the caller that knows the error type
//!
//! ## Usage
//!
//! ```rust
//! use tally_slow_checks::checks::CheckContext;
//! use tally_slow_checks::resilience::{retry, BackoffConfig, RetryDecision};
//!
//! # async fn example() {
//! let config = BackoffConfig {
//!     initial_interval_ms: 1,
//!     max_interval_ms: 2,
//!     ..BackoffConfig::default()
//! };
//! let result = retry(
//!     &CheckContext::new(),
//!     &config,
//!     |attempt| async move { if attempt < 2 { Err("flaky") } else { Ok(attempt) } },
//!     |_| RetryDecision::Retry,
//! )
//! .await;
//! assert_eq!(result.ok(), Some(2));
//! # }
//! ```

pub mod backoff;

pub use backoff::{retry, BackoffConfig, RetryDecision, RetryError};
