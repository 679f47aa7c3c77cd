//! Per-stage registry facts for reporting, extracted from a finished run.

use crate::checks::{CheckRequest, ResolvedValue, RunResult};
use crate::constants::resolvers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the registry said about one stage's base image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryInsight {
    pub stage_index: usize,
    pub reference: String,
    pub requested_platform: String,
    /// Platform of the resolved manifest; empty when unknown
    pub resolved_platform: String,
    pub digest: String,
    /// Only populated on a platform mismatch
    pub available_platforms: Vec<String>,
}

/// file (forward slashes) -> `"<stage>|<key>"` -> insight
pub type RegistryInsights = BTreeMap<String, BTreeMap<String, RegistryInsight>>;

/// Collect insights for every registry request whose key resolved
pub fn collect_registry_insights(plans: &[CheckRequest], result: &RunResult) -> RegistryInsights {
    let mut insights = RegistryInsights::new();

    for request in plans {
        if request.resolver_id != resolvers::REGISTRY {
            continue;
        }
        let Some(image) = request.data.as_image() else {
            continue;
        };
        let Some(resolved) = result.resolved.get(&request.resolution_key()) else {
            continue;
        };

        let mut insight = RegistryInsight {
            stage_index: request.stage_index,
            reference: image.reference.clone(),
            requested_platform: image.platform.clone(),
            ..RegistryInsight::default()
        };
        match resolved.as_ref() {
            ResolvedValue::Image(config) => {
                insight.resolved_platform = config.platform();
                insight.digest = config.digest.clone();
            }
            ResolvedValue::PlatformMismatch(mismatch) => {
                if let Some(partial) = &mismatch.partial {
                    insight.resolved_platform = partial.platform();
                    insight.digest = partial.digest.clone();
                }
                insight.available_platforms = mismatch.available.clone();
            }
            ResolvedValue::Json(_) => continue,
        }

        insights
            .entry(request.file.replace('\\', "/"))
            .or_default()
            .insert(format!("{}|{}", request.stage_index, request.key), insight);
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{ResolveInput, ResultHandler};
    use crate::image::{ImageConfig, ImageRequest, PlatformMismatch};
    use std::sync::Arc;

    fn registry_request(file: &str, stage: usize, reference: &str) -> CheckRequest {
        let image = ImageRequest::new(reference, "linux/amd64");
        let handler: Arc<dyn ResultHandler> = Arc::new(|_: &ResolvedValue| Some(Vec::new()));
        let key = image.dedupe_key();
        let input = ResolveInput::Image(image);
        CheckRequest::new("base-image", resolvers::REGISTRY, key, input, handler)
            .with_location(file, stage)
    }

    #[test]
    fn test_collects_resolved_and_mismatched_stages() {
        let ok = registry_request("app\\Dockerfile", 0, "alpine:3.20");
        let mismatched = registry_request("app\\Dockerfile", 1, "scratchy:1");
        let unresolved = registry_request("other/Dockerfile", 0, "ghost:1");

        let mut result = RunResult::default();
        result.resolved.insert(
            ok.resolution_key(),
            Arc::new(ResolvedValue::Image(ImageConfig {
                os: "linux".into(),
                arch: "amd64".into(),
                digest: "sha256:abc".into(),
                ..ImageConfig::default()
            })),
        );
        result.resolved.insert(
            mismatched.resolution_key(),
            Arc::new(ResolvedValue::PlatformMismatch(PlatformMismatch {
                reference: "scratchy:1".into(),
                requested: "linux/amd64".into(),
                available: vec!["linux/arm64".into()],
                partial: None,
            })),
        );

        let insights = collect_registry_insights(&[ok, mismatched, unresolved], &result);

        assert_eq!(insights.len(), 1);
        let file = &insights["app/Dockerfile"];
        let first = &file["0|alpine:3.20|linux/amd64"];
        assert_eq!(first.resolved_platform, "linux/amd64");
        assert_eq!(first.digest, "sha256:abc");
        assert!(first.available_platforms.is_empty());

        let second = &file["1|scratchy:1|linux/amd64"];
        assert_eq!(second.resolved_platform, "");
        assert_eq!(second.available_platforms, vec!["linux/arm64".to_string()]);
    }

    #[test]
    fn test_ignores_other_resolvers() {
        let handler: Arc<dyn ResultHandler> = Arc::new(|_: &ResolvedValue| Some(Vec::new()));
        let input = ResolveInput::Json(serde_json::Value::Null);
        let request = CheckRequest::new("r", "http", "k", input, handler);
        let mut result = RunResult::default();
        result.resolved.insert(
            request.resolution_key(),
            Arc::new(ResolvedValue::Json(serde_json::Value::Null)),
        );

        assert!(collect_registry_insights(&[request], &result).is_empty());
    }
}
