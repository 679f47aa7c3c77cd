//! # Resolver Error Classification
//!
//! Maps resolver failures onto the closed [`SkipReason`] taxonomy.
//!
//! ## Order
//!
//! 1. Cancellation and deadline errors are `timeout`. This is checked first
//!    because a resolver that ignores its context can still surface the
//!    cancellation wrapped in a generic error.
//! 2. Errors exposing [`ClassifiedError`] report their own reason.
//! 3. Everything else is `resolver-error`.

use crate::checks::errors::ResolveError;
use crate::checks::types::SkipReason;
use std::error::Error;

/// Classify a resolver failure
pub fn classify_error(error: &ResolveError) -> SkipReason {
    if is_timeout(error) {
        return SkipReason::Timeout;
    }
    classified_reason(error).unwrap_or(SkipReason::ResolverError)
}

/// Classify an optional failure; no error means no reason
pub fn classify_optional(error: Option<&ResolveError>) -> Option<SkipReason> {
    error.map(classify_error)
}

fn is_timeout(error: &ResolveError) -> bool {
    match error {
        e if e.is_context_error() => true,
        ResolveError::Classified(inner) => {
            std::iter::successors(inner.source(), |&cause| cause.source()).any(is_timeout_cause)
        }
        ResolveError::Other(inner) => inner.chain().any(is_timeout_cause),
        _ => false,
    }
}

fn is_timeout_cause(cause: &(dyn Error + 'static)) -> bool {
    cause.is::<tokio::time::error::Elapsed>()
        || cause.downcast_ref::<ResolveError>().is_some_and(is_timeout)
}

fn classified_reason(error: &ResolveError) -> Option<SkipReason> {
    match error {
        ResolveError::Classified(inner) => Some(inner.skip_reason()),
        ResolveError::Other(inner) => inner
            .chain()
            .filter_map(|cause| cause.downcast_ref::<ResolveError>())
            .find_map(|wrapped| match wrapped {
                ResolveError::Classified(e) => Some(e.skip_reason()),
                _ => None,
            }),
        _ => None,
    }
}
