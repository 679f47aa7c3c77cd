//! # Plan Filtering
//!
//! Applies per-file slow-check policy to planned requests before they reach
//! the [`Runtime`](crate::checks::Runtime).
//!
//! For each request, the file's [`SlowChecksConfig`] is used, else the
//! fallback. Requests with neither are dropped without a trace.
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | mode `off` | `Skipped(disabled)` |
//! | mode `auto` under CI | `Skipped(disabled)`, counted as auto-skipped |
//! | `fail_fast` and the file has an error-severity fast violation | `Skipped(fail-fast)` |
//! | otherwise | kept, with the file's timeout applied |

use crate::checks::types::{CheckRequest, Severity, SkipReason, Skipped, Violation};
use crate::config::{CiEnvironment, SlowChecksConfig, SlowChecksMode};
use crate::constants::DEFAULT_SLOW_CHECK_TIMEOUT;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::warn;

/// Slow-check policy for a lint invocation
#[derive(Debug, Clone, Default)]
pub struct PlanPolicy {
    /// Config per file path
    pub files: HashMap<String, SlowChecksConfig>,
    /// Used for files without their own config
    pub fallback: Option<SlowChecksConfig>,
    /// CI system detected for `auto` mode
    pub ci: Option<CiEnvironment>,
}

impl PlanPolicy {
    /// Policy with one config for every file, detecting CI from the environment
    pub fn uniform(config: SlowChecksConfig) -> Self {
        Self {
            files: HashMap::new(),
            fallback: Some(config),
            ci: CiEnvironment::detect(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>, config: SlowChecksConfig) -> Self {
        self.files.insert(file.into(), config);
        self
    }

    pub fn with_ci(mut self, ci: Option<CiEnvironment>) -> Self {
        self.ci = ci;
        self
    }

    fn config_for(&self, file: &str) -> Option<&SlowChecksConfig> {
        self.files.get(file).or(self.fallback.as_ref())
    }
}

/// Requests that survived filtering and the run budget they need
#[derive(Debug, Clone)]
pub struct PlanSelection {
    pub plans: Vec<CheckRequest>,
    /// Default budget raised to the largest per-file timeout
    pub timeout: Duration,
    pub skipped: Vec<Skipped>,
    /// Requests disabled by `auto` mode under CI
    pub skipped_auto: usize,
}

/// Filter `plans` by policy, given the fast-path violations of this run
pub fn filter_plans(
    plans: Vec<CheckRequest>,
    fast_violations: &[Violation],
    policy: &PlanPolicy,
) -> PlanSelection {
    let error_files: HashSet<&str> = fast_violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .map(|v| v.file.as_str())
        .collect();

    let mut selection = PlanSelection {
        plans: Vec::new(),
        timeout: DEFAULT_SLOW_CHECK_TIMEOUT,
        skipped: Vec::new(),
        skipped_auto: 0,
    };

    for mut request in plans {
        let Some(config) = policy.config_for(&request.file) else {
            continue;
        };

        if !config.mode.enabled(policy.ci) {
            if config.mode == SlowChecksMode::Auto {
                selection.skipped_auto += 1;
            }
            selection
                .skipped
                .push(Skipped::new(request, SkipReason::Disabled));
            continue;
        }

        if config.fail_fast && error_files.contains(request.file.as_str()) {
            selection
                .skipped
                .push(Skipped::new(request, SkipReason::FailFast));
            continue;
        }

        if let Some(timeout) = config.timeout_duration() {
            request.timeout = Some(timeout);
            selection.timeout = selection.timeout.max(timeout);
        }
        selection.plans.push(request);
    }

    if let Some(note) = auto_skip_note(selection.skipped_auto, policy.ci) {
        warn!(skipped = selection.skipped_auto, "{note}");
    }

    selection
}

/// User-facing note for checks disabled by `auto` mode
pub fn auto_skip_note(skipped_auto: usize, ci: Option<CiEnvironment>) -> Option<String> {
    if skipped_auto == 0 {
        return None;
    }
    let note = match ci.map(|ci| ci.name()).filter(|name| !name.is_empty()) {
        Some(name) => format!(
            "{skipped_auto} slow check(s) skipped ({name} detected; use --slow-checks=on to enable)"
        ),
        None => format!("{skipped_auto} slow check(s) skipped (use --slow-checks=on to enable)"),
    };
    Some(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::types::{ResolveInput, ResolvedValue, ResultHandler};
    use std::sync::Arc;

    fn request(file: &str) -> CheckRequest {
        let handler: Arc<dyn ResultHandler> = Arc::new(|_: &ResolvedValue| Some(Vec::new()));
        let input = ResolveInput::Json(serde_json::Value::Null);
        CheckRequest::new("rule", "registry", "k", input, handler).with_location(file, 0)
    }

    fn config(mode: SlowChecksMode, fail_fast: bool, timeout: &str) -> SlowChecksConfig {
        SlowChecksConfig {
            mode,
            fail_fast,
            timeout: timeout.into(),
        }
    }

    #[test]
    fn test_modes() {
        let policy = PlanPolicy::default()
            .with_file("on", config(SlowChecksMode::On, false, "20s"))
            .with_file("off", config(SlowChecksMode::Off, false, "20s"))
            .with_file("auto", config(SlowChecksMode::Auto, false, "20s"))
            .with_ci(Some(CiEnvironment::GitHubActions));

        let selection = filter_plans(
            vec![request("on"), request("off"), request("auto"), request("unconfigured")],
            &[],
            &policy,
        );

        assert_eq!(selection.plans.len(), 1);
        assert_eq!(selection.plans[0].file, "on");
        assert_eq!(selection.skipped.len(), 2);
        assert!(selection.skipped.iter().all(|s| s.reason == SkipReason::Disabled));
        assert_eq!(selection.skipped_auto, 1);
    }

    #[test]
    fn test_fail_fast_only_for_error_files() {
        let policy = PlanPolicy {
            fallback: Some(config(SlowChecksMode::On, true, "")),
            ..PlanPolicy::default()
        };
        let fast = vec![
            Violation::new("x", "broken", 0, "bad", Severity::Error),
            Violation::new("y", "noisy", 0, "meh", Severity::Warning),
        ];

        let selection = filter_plans(vec![request("broken"), request("noisy")], &fast, &policy);

        assert_eq!(selection.plans.len(), 1);
        assert_eq!(selection.plans[0].file, "noisy");
        assert_eq!(selection.skipped[0].reason, SkipReason::FailFast);
        assert_eq!(selection.skipped[0].request.file, "broken");
    }

    #[test]
    fn test_timeouts_applied_and_raise_budget() {
        let policy = PlanPolicy::default()
            .with_file("slow", config(SlowChecksMode::On, false, "45s"))
            .with_file("quick", config(SlowChecksMode::On, false, "5s"))
            .with_file("bogus", config(SlowChecksMode::On, false, "later"));

        let selection = filter_plans(
            vec![request("slow"), request("quick"), request("bogus")],
            &[],
            &policy,
        );

        assert_eq!(selection.timeout, Duration::from_secs(45));
        let timeouts: Vec<_> = selection.plans.iter().map(|p| p.timeout).collect();
        assert_eq!(
            timeouts,
            vec![Some(Duration::from_secs(45)), Some(Duration::from_secs(5)), None]
        );
    }

    #[test]
    fn test_uniform_policy_covers_every_file() {
        let policy = PlanPolicy::uniform(config(SlowChecksMode::On, false, "20s")).with_ci(None);
        let selection = filter_plans(vec![request("a"), request("b")], &[], &policy);
        assert_eq!(selection.plans.len(), 2);
    }

    #[test]
    fn test_default_budget() {
        let selection = filter_plans(Vec::new(), &[], &PlanPolicy::default());
        assert_eq!(selection.timeout, Duration::from_secs(20));
        assert!(selection.plans.is_empty());
    }

    #[test]
    fn test_auto_skip_note() {
        assert_eq!(auto_skip_note(0, None), None);
        assert_eq!(
            auto_skip_note(2, Some(CiEnvironment::GitLabCi)).unwrap(),
            "2 slow check(s) skipped (GitLab CI detected; use --slow-checks=on to enable)"
        );
        assert_eq!(
            auto_skip_note(1, Some(CiEnvironment::Generic)).unwrap(),
            "1 slow check(s) skipped (use --slow-checks=on to enable)"
        );
    }
}
