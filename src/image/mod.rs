//! # Image Resolution
//!
//! Registry lookups of base-image metadata (environment, platform, digest) used
//! by slow lint checks.
//!
//! The actual registry client is supplied by the caller through
//! [`ImageResolver`]; [`AsyncImageResolver`] adapts it to the runtime's
//! [`Resolver`](crate::checks::Resolver) capability and adds retries.
//!
//! ## Error contract
//!
//! | Error | Skip reason | Retry policy |
//! |-------|-------------|--------------|
//! | `Auth` | `auth` | retried once |
//! | `Network` | `network` | exponential backoff |
//! | `NotFound` | `not-found` | never |
//! | `PlatformMismatch` | (not a skip) | never; becomes the resolved value |

pub mod async_resolver;
pub mod insights;

pub use async_resolver::AsyncImageResolver;
pub use insights::{collect_registry_insights, RegistryInsight, RegistryInsights};

use crate::checks::{CheckContext, ClassifiedError, SkipReason};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Resolves image configuration from a registry
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolve image config for `reference` and `platform` (e.g. `linux/amd64`).
    async fn resolve_config(
        &self,
        ctx: &CheckContext,
        reference: &str,
        platform: &str,
    ) -> Result<ImageConfig, ImageError>;
}

/// Typed input for the registry resolver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRequest {
    pub reference: String,
    pub platform: String,
}

impl ImageRequest {
    pub fn new(reference: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            platform: platform.into(),
        }
    }

    /// Dedupe key encoding everything the lookup depends on
    pub fn dedupe_key(&self) -> String {
        format!("{}|{}", self.reference, self.platform)
    }
}

/// Resolved image metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Environment variables (KEY=VALUE parsed to a map)
    pub env: BTreeMap<String, String>,
    pub os: String,
    pub arch: String,
    pub variant: String,
    /// Resolved manifest digest
    pub digest: String,
    /// True if the image defines a HEALTHCHECK other than NONE
    pub has_healthcheck: bool,
}

impl ImageConfig {
    pub fn platform(&self) -> String {
        format_platform(&self.os, &self.arch, &self.variant)
    }
}

/// The image exists but no manifest matches the requested platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMismatch {
    pub reference: String,
    pub requested: String,
    pub available: Vec<String>,
    /// Config of the single-manifest image that did not match, when known
    pub partial: Option<ImageConfig>,
}

/// Image lookup failure
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 401/403, missing or expired credentials
    #[error("auth error: {source}")]
    Auth { source: BoxError },

    /// Transient network failure
    #[error("network error: {source}")]
    Network { source: BoxError },

    /// Reference, tag or manifest not found
    #[error("not found: {reference}: {source}")]
    NotFound { reference: String, source: BoxError },

    /// Image exists but has no manifest for the requested platform
    #[error(
        "platform mismatch for {}: requested {}, available {:?}",
        .0.reference,
        .0.requested,
        .0.available
    )]
    PlatformMismatch(PlatformMismatch),
}

impl ImageError {
    pub fn auth(source: impl Into<BoxError>) -> Self {
        ImageError::Auth {
            source: source.into(),
        }
    }

    pub fn network(source: impl Into<BoxError>) -> Self {
        ImageError::Network {
            source: source.into(),
        }
    }

    pub fn not_found(reference: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ImageError::NotFound {
            reference: reference.into(),
            source: source.into(),
        }
    }
}

impl ClassifiedError for ImageError {
    fn skip_reason(&self) -> SkipReason {
        match self {
            ImageError::Auth { .. } => SkipReason::Auth,
            ImageError::Network { .. } => SkipReason::Network,
            ImageError::NotFound { .. } => SkipReason::NotFound,
            ImageError::PlatformMismatch(_) => SkipReason::ResolverError,
        }
    }
}

/// `os/arch[/variant]`
pub fn format_platform(os: &str, arch: &str, variant: &str) -> String {
    if variant.is_empty() {
        format!("{os}/{arch}")
    } else {
        format!("{os}/{arch}/{variant}")
    }
}

/// Split `os/arch/variant`; missing parts are empty
pub fn parse_platform(platform: &str) -> (String, String, String) {
    let mut parts = platform.splitn(3, '/');
    let os = parts.next().unwrap_or_default().to_string();
    let arch = parts.next().unwrap_or_default().to_string();
    let variant = parts.next().unwrap_or_default().to_string();
    (os, arch, variant)
}

/// Case-insensitive match; empty wanted parts match anything
pub fn matches_platform(image: &ImageConfig, wanted: &str) -> bool {
    let (os, arch, variant) = parse_platform(wanted);
    let part_matches = |have: &str, want: &str| want.is_empty() || have.eq_ignore_ascii_case(want);
    part_matches(&image.os, &os)
        && part_matches(&image.arch, &arch)
        && part_matches(&image.variant, &variant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::classify_error;
    use crate::checks::ResolveError;

    #[test]
    fn test_platform_helpers() {
        assert_eq!(format_platform("linux", "amd64", ""), "linux/amd64");
        assert_eq!(format_platform("linux", "arm64", "v8"), "linux/arm64/v8");
        assert_eq!(
            parse_platform("linux/arm64/v8"),
            ("linux".into(), "arm64".into(), "v8".into())
        );
        assert_eq!(parse_platform("linux"), ("linux".into(), String::new(), String::new()));
    }

    #[test]
    fn test_matches_platform() {
        let image = ImageConfig {
            os: "linux".into(),
            arch: "arm64".into(),
            variant: "v8".into(),
            ..ImageConfig::default()
        };
        assert!(matches_platform(&image, "linux/arm64"));
        assert!(matches_platform(&image, "Linux/ARM64/v8"));
        assert!(!matches_platform(&image, "linux/amd64"));
        assert!(!matches_platform(&image, "linux/arm64/v7"));
        assert_eq!(image.platform(), "linux/arm64/v8");
    }

    #[test]
    fn test_image_errors_classify() {
        let cases = vec![
            (ImageError::auth("401 unauthorized"), SkipReason::Auth),
            (ImageError::network("connection reset"), SkipReason::Network),
            (ImageError::not_found("alpine:nope", "manifest unknown"), SkipReason::NotFound),
        ];
        for (error, expected) in cases {
            assert_eq!(classify_error(&ResolveError::classified(error)), expected);
        }
    }

    #[test]
    fn test_error_messages() {
        let err = ImageError::not_found("alpine:nope", "manifest unknown");
        assert_eq!(err.to_string(), "not found: alpine:nope: manifest unknown");

        let mismatch = ImageError::PlatformMismatch(PlatformMismatch {
            reference: "alpine:3.20".into(),
            requested: "linux/s390x".into(),
            available: vec!["linux/amd64".into()],
            partial: None,
        });
        assert_eq!(
            mismatch.to_string(),
            "platform mismatch for alpine:3.20: requested linux/s390x, available [\"linux/amd64\"]"
        );
    }

    #[test]
    fn test_dedupe_key() {
        let request = ImageRequest::new("alpine:3.20", "linux/amd64");
        assert_eq!(request.dedupe_key(), "alpine:3.20|linux/amd64");
    }
}
