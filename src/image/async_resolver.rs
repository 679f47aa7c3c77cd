//! # Registry Resolver
//!
//! Adapts an [`ImageResolver`] into the runtime's [`Resolver`] capability,
//! retrying transient failures with exponential backoff.
//!
//! Retry policy per failure kind:
//!
//! - platform mismatch: never retried, returned as a resolved value
//! - not found: never retried
//! - auth: one retry (credentials may be refreshing), then permanent
//! - anything else: retried until the attempt budget or the context runs out

use crate::checks::{CheckContext, ResolveError, ResolveInput, ResolvedValue, Resolver};
use crate::constants::resolvers;
use crate::image::{ImageError, ImageResolver};
use crate::resilience::{retry, BackoffConfig, RetryDecision, RetryError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct AsyncImageResolver {
    inner: Arc<dyn ImageResolver>,
    backoff: BackoffConfig,
}

impl AsyncImageResolver {
    pub fn new(inner: Arc<dyn ImageResolver>) -> Self {
        Self {
            inner,
            backoff: BackoffConfig::default(),
        }
    }

    /// Use `backoff` for retries. An invalid config is replaced by the defaults.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = match backoff.validate() {
            Ok(()) => backoff,
            Err(reason) => {
                warn!(%reason, ?backoff, "Invalid backoff config, using defaults");
                BackoffConfig::default()
            }
        };
        self
    }

    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }
}

impl std::fmt::Debug for AsyncImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncImageResolver")
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolver for AsyncImageResolver {
    fn id(&self) -> &str {
        resolvers::REGISTRY
    }

    #[instrument(skip(self, ctx, input), fields(resolver = resolvers::REGISTRY))]
    async fn resolve(
        &self,
        ctx: &CheckContext,
        input: &ResolveInput,
    ) -> Result<ResolvedValue, ResolveError> {
        let request = input.as_image().ok_or_else(|| ResolveError::UnexpectedInput {
            resolver_id: resolvers::REGISTRY.to_string(),
            expected: "image request",
        })?;

        let mut auth_retried = false;
        let outcome = retry(
            ctx,
            &self.backoff,
            |attempt| {
                debug!(
                    reference = %request.reference,
                    platform = %request.platform,
                    attempt = attempt,
                    "Resolving image config"
                );
                self.inner
                    .resolve_config(ctx, &request.reference, &request.platform)
            },
            |error| match error {
                ImageError::PlatformMismatch(_) | ImageError::NotFound { .. } => {
                    RetryDecision::Permanent
                }
                ImageError::Auth { .. } if auth_retried => RetryDecision::Permanent,
                ImageError::Auth { .. } => {
                    auth_retried = true;
                    RetryDecision::Retry
                }
                ImageError::Network { .. } => RetryDecision::Retry,
            },
        )
        .await;

        match outcome {
            Ok(config) => Ok(ResolvedValue::Image(config)),
            Err(RetryError::Failed {
                error: ImageError::PlatformMismatch(mismatch),
                ..
            }) => Ok(ResolvedValue::PlatformMismatch(mismatch)),
            Err(RetryError::Failed { error, attempts }) => {
                debug!(
                    reference = %request.reference,
                    attempts = attempts,
                    error = %error,
                    "Image resolution failed"
                );
                Err(ResolveError::classified(error))
            }
            Err(RetryError::Interrupted(error)) => Err(error),
        }
    }
}
