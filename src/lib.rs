#![allow(clippy::doc_markdown)] // Allow technical terms like HEALTHCHECK, OCI in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tally Slow Checks
//!
//! Asynchronous execution runtime for the slow checks of a Dockerfile linter.
//!
//! ## Overview
//!
//! Fast lint rules pattern-match the parsed build file. Some rules also need a
//! lookup that may be remote, such as fetching base-image metadata from a
//! registry. Those rules emit [`CheckRequest`]s; this crate executes them under
//! a concurrency cap and a wall-clock budget, resolves identical lookups once,
//! and fans the result back out to every requesting rule.
//!
//! ## Module Organization
//!
//! - [`checks`] - Request types, the execution [`Runtime`], plan filtering,
//!   skip reporting and violation merging
//! - [`registry`] - Resolver registration and discovery
//! - [`image`] - Registry image resolution with retries, plus per-stage insights
//! - [`resilience`] - Exponential backoff
//! - [`config`] - Layered configuration (defaults, TOML, environment)
//! - [`logging`] - Structured logging setup
//! - [`constants`] - Defaults and identifiers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tally_slow_checks::checks::{
//!     CheckContext, CheckRequest, HandlerOutput, ResolveInput, ResolvedValue, Runtime,
//!     RuntimeConfig, Severity, Violation,
//! };
//! use tally_slow_checks::image::{AsyncImageResolver, ImageRequest, ImageResolver};
//! use tally_slow_checks::registry::ResolverRegistry;
//!
//! # async fn example(client: Arc<dyn ImageResolver>) {
//! let resolvers = Arc::new(ResolverRegistry::new());
//! resolvers.register(Arc::new(AsyncImageResolver::new(client)));
//!
//! let image = ImageRequest::new("alpine:3.20", "linux/amd64");
//! let request = CheckRequest::new(
//!     "base-image-healthcheck",
//!     "registry",
//!     image.dedupe_key(),
//!     ResolveInput::Image(image),
//!     Arc::new(|value: &ResolvedValue| {
//!         let config = value.as_image()?;
//!         let mut findings = Vec::new();
//!         if !config.has_healthcheck {
//!             findings.push(HandlerOutput::from(Violation::new(
//!                 "base-image-healthcheck",
//!                 "Dockerfile",
//!                 0,
//!                 "base image defines no HEALTHCHECK",
//!                 Severity::Info,
//!             )));
//!         }
//!         Some(findings)
//!     }),
//! )
//! .with_location("Dockerfile", 0);
//!
//! let runtime = Runtime::new(RuntimeConfig::default()).with_resolvers(resolvers);
//! let result = runtime.run(&CheckContext::new(), vec![request]).await;
//! println!("{} violation(s), {} skipped", result.violations.len(), result.skipped.len());
//! # }
//! ```

pub mod checks;
pub mod config;
pub mod constants;
pub mod image;
pub mod logging;
pub mod registry;
pub mod resilience;

pub use checks::{
    CheckContext, CheckRequest, ResolveError, ResolvedValue, Resolver, RunResult, Runtime,
    RuntimeConfig, SkipReason,
};
pub use config::{ConfigManager, ConfigurationError, TallyConfig};
pub use registry::ResolverRegistry;
