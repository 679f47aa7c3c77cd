//! # Registry Infrastructure
//!
//! Component registration and discovery for the slow-check runtime.
//!
//! ## Available Registries
//!
//! - **ResolverRegistry**: resolver id -> [`Resolver`](crate::checks::Resolver)
//!   implementation, with a process-wide default instance
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_slow_checks::registry::ResolverRegistry;
//! use tally_slow_checks::checks::{Runtime, RuntimeConfig};
//!
//! let resolvers = Arc::new(ResolverRegistry::new());
//! // resolvers.register(Arc::new(my_resolver));
//! let runtime = Runtime::new(RuntimeConfig::default()).with_resolvers(resolvers);
//! # let _ = runtime;
//! ```

pub mod resolver_registry;

pub use resolver_registry::{get_resolver, register_resolver, ResolverRegistry};
