use crate::checks::context::CheckContext;
use crate::checks::errors::ResolveError;
use crate::checks::types::{ResolveInput, ResolvedValue};
use async_trait::async_trait;

/// Fulfills slow check requests.
///
/// Implementations should honor `ctx`: the runtime never interrupts a call in
/// progress, so a resolver that ignores its context runs until it returns.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Unique identifier used for registry lookup
    fn id(&self) -> &str;

    /// Execute the lookup for the request's input
    async fn resolve(
        &self,
        ctx: &CheckContext,
        input: &ResolveInput,
    ) -> Result<ResolvedValue, ResolveError>;
}
