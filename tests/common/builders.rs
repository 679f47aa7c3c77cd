//! Request and registry builders shared by integration tests.

use std::sync::Arc;
use std::time::Duration;
use tally_slow_checks::checks::{
    CheckRequest, HandlerOutput, ResolveInput, ResolvedValue, ResultHandler, Severity, Violation,
};
use tally_slow_checks::image::ImageRequest;
use tally_slow_checks::registry::ResolverRegistry;
use tally_slow_checks::Resolver;

/// Handler that completes without findings
pub fn completing_handler() -> Arc<dyn ResultHandler> {
    Arc::new(|_: &ResolvedValue| Some(Vec::new()))
}

/// Handler that reports one warning for `rule` at (`file`, `stage`)
pub fn violation_handler(rule: &str, file: &str, stage: usize) -> Arc<dyn ResultHandler> {
    let violation = Violation::new(rule, file, stage, format!("{rule} finding"), Severity::Warning);
    Arc::new(move |_: &ResolvedValue| Some(vec![HandlerOutput::from(violation.clone())]))
}

/// JSON request for resolver `resolver_id` with dedupe key `key`
pub fn json_request(resolver_id: &str, key: &str) -> CheckRequest {
    CheckRequest::new(
        "test-rule",
        resolver_id,
        key,
        ResolveInput::Json(serde_json::json!({ "key": key })),
        completing_handler(),
    )
}

/// Registry-resolver request for `reference` on linux/amd64
pub fn image_request(rule: &str, file: &str, stage: usize, reference: &str) -> CheckRequest {
    let image = ImageRequest::new(reference, "linux/amd64");
    CheckRequest::new(
        rule,
        "registry",
        image.dedupe_key(),
        ResolveInput::Image(image),
        completing_handler(),
    )
    .with_location(file, stage)
}

pub fn with_timeout(request: CheckRequest, timeout: Duration) -> CheckRequest {
    request.with_timeout(timeout)
}

/// Private registry holding `resolvers`
pub fn registry_with(resolvers: Vec<Arc<dyn Resolver>>) -> Arc<ResolverRegistry> {
    Arc::new(resolvers.into_iter().collect())
}
