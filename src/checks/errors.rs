//! Resolver error types.

use crate::checks::types::SkipReason;

/// Capability exposed by domain errors that know their own skip reason.
///
/// The classifier uses it verbatim, so domain-specific failures (auth, network,
/// not-found) reach the runtime without it knowing their concrete types.
pub trait ClassifiedError: std::error::Error + Send + Sync + 'static {
    fn skip_reason(&self) -> SkipReason;
}

/// Failure returned by a [`Resolver`](crate::checks::Resolver)
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The caller's context was cancelled
    #[error("slow check cancelled")]
    Cancelled,

    /// The run-wide or per-request deadline elapsed
    #[error("slow check deadline exceeded")]
    DeadlineExceeded,

    /// No resolver registered under the requested id
    #[error("unknown resolver: {resolver_id}")]
    UnknownResolver { resolver_id: String },

    /// The request carried input of the wrong kind for this resolver
    #[error("{resolver_id} resolver: unexpected input, expected {expected}")]
    UnexpectedInput {
        resolver_id: String,
        expected: &'static str,
    },

    /// Domain error carrying its own skip reason
    #[error("{0}")]
    Classified(Box<dyn ClassifiedError>),

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResolveError {
    pub fn classified<E: ClassifiedError>(error: E) -> Self {
        ResolveError::Classified(Box::new(error))
    }

    /// True for cancellation and deadline errors
    pub fn is_context_error(&self) -> bool {
        matches!(self, ResolveError::Cancelled | ResolveError::DeadlineExceeded)
    }
}
