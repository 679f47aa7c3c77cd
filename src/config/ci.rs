//! Continuous-integration detection used by the `auto` slow-check mode.

use std::collections::HashMap;
use std::env;

/// CI system the process is running under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CiEnvironment {
    GitHubActions,
    GitLabCi,
    CircleCi,
    Buildkite,
    Jenkins,
    AzurePipelines,
    TravisCi,
    /// `CI` is set but the vendor is unknown
    Generic,
}

/// Vendor-specific markers, checked before the generic `CI` variable
const MARKERS: [(&str, CiEnvironment); 7] = [
    ("GITHUB_ACTIONS", CiEnvironment::GitHubActions),
    ("GITLAB_CI", CiEnvironment::GitLabCi),
    ("CIRCLECI", CiEnvironment::CircleCi),
    ("BUILDKITE", CiEnvironment::Buildkite),
    ("JENKINS_URL", CiEnvironment::Jenkins),
    ("TF_BUILD", CiEnvironment::AzurePipelines),
    ("TRAVIS", CiEnvironment::TravisCi),
];

impl CiEnvironment {
    /// Detect from the process environment
    pub fn detect() -> Option<Self> {
        Self::detect_with(|name| env::var(name).ok())
    }

    /// Detect from an explicit variable map
    pub fn detect_from(vars: &HashMap<String, String>) -> Option<Self> {
        Self::detect_with(|name| vars.get(name).cloned())
    }

    fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let is_set = |name: &str| {
            lookup(name).is_some_and(|value| {
                let value = value.trim();
                !value.is_empty() && !value.eq_ignore_ascii_case("false") && value != "0"
            })
        };

        MARKERS
            .iter()
            .find(|(name, _)| is_set(name))
            .map(|(_, ci)| *ci)
            .or_else(|| is_set("CI").then_some(CiEnvironment::Generic))
    }

    /// Human-readable name; empty for the generic case
    pub fn name(&self) -> &'static str {
        match self {
            CiEnvironment::GitHubActions => "GitHub Actions",
            CiEnvironment::GitLabCi => "GitLab CI",
            CiEnvironment::CircleCi => "CircleCI",
            CiEnvironment::Buildkite => "Buildkite",
            CiEnvironment::Jenkins => "Jenkins",
            CiEnvironment::AzurePipelines => "Azure Pipelines",
            CiEnvironment::TravisCi => "Travis CI",
            CiEnvironment::Generic => "",
        }
    }
}
