//! # Slow Checks
//!
//! Lint checks that need I/O (registry lookups) run here, separately from the
//! fast pattern-matching rules.
//!
//! ## Flow
//!
//! ```text
//! planned requests ─▶ plan filter ─▶ Runtime ─▶ RunResult ─▶ merge / report
//!                      (policy)      (dedup, cap, deadline)
//! ```
//!
//! ## Key Components
//!
//! - [`Runtime`]: executes a batch with dedup, a concurrency cap and deadlines
//! - [`Resolver`]: performs one lookup; registered in a
//!   [`ResolverRegistry`](crate::registry::ResolverRegistry)
//! - [`ResultHandler`]: turns a resolved value into findings
//! - [`classify_error`]: maps resolver failures to a [`SkipReason`]
//! - [`CheckContext`]: cancellation plus deadline for each lookup
//! - [`SlowCheckSession`]: filter, run, report and merge in one call

pub mod context;
pub mod error_classifier;
pub mod errors;
pub mod merge;
pub mod plan;
pub mod report;
pub mod resolver;
pub mod runtime;
pub mod session;
pub mod types;

pub use context::CheckContext;
pub use error_classifier::{classify_error, classify_optional};
pub use errors::{ClassifiedError, ResolveError};
pub use merge::merge_async_violations;
pub use plan::{auto_skip_note, filter_plans, PlanPolicy, PlanSelection};
pub use report::SkipSummary;
pub use resolver::Resolver;
pub use runtime::{group_requests, RequestGroup, Runtime, RuntimeConfig};
pub use session::{SessionOutcome, SlowCheckSession};
pub use types::{
    Category, CheckRequest, CompletedCheck, HandlerOutput, ResolutionKey, ResolveInput,
    ResolvedValue, ResultHandler, Severity, SkipReason, Skipped, RunResult, Violation,
};
