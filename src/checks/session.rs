//! # Slow Check Session
//!
//! End-to-end slow-check pass for one lint invocation: filter the planned
//! requests by policy, run the survivors, report skips, and merge slow
//! findings into the fast ones.

use crate::checks::context::CheckContext;
use crate::checks::merge::merge_async_violations;
use crate::checks::plan::{filter_plans, PlanPolicy};
use crate::checks::report::SkipSummary;
use crate::checks::runtime::{Runtime, RuntimeConfig};
use crate::checks::types::{CheckRequest, RunResult, Skipped, Violation};
use crate::registry::ResolverRegistry;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Everything a caller needs after the slow-check pass
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// `None` when nothing survived filtering
    pub result: Option<RunResult>,
    /// Requests that were executed, with per-file timeouts applied
    pub plans: Vec<CheckRequest>,
    /// Filter-time and runtime skips
    pub skipped: Vec<Skipped>,
    /// Fast violations merged with slow results
    pub violations: Vec<Violation>,
    pub summary: SkipSummary,
}

#[derive(Debug, Clone, Default)]
pub struct SlowCheckSession {
    config: RuntimeConfig,
    resolvers: Option<Arc<ResolverRegistry>>,
}

impl SlowCheckSession {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            resolvers: None,
        }
    }

    pub fn with_resolvers(mut self, resolvers: Arc<ResolverRegistry>) -> Self {
        self.resolvers = Some(resolvers);
        self
    }

    #[instrument(skip_all, fields(planned = plans.len(), fast = fast.len()))]
    pub async fn execute(
        &self,
        ctx: &CheckContext,
        plans: Vec<CheckRequest>,
        fast: Vec<Violation>,
        policy: &PlanPolicy,
    ) -> SessionOutcome {
        let selection = filter_plans(plans, &fast, policy);
        let mut skipped = selection.skipped;

        if selection.plans.is_empty() {
            debug!(filtered = skipped.len(), "No slow checks to run");
            let summary = SkipSummary::from_skipped(&skipped);
            return SessionOutcome {
                result: None,
                plans: Vec::new(),
                skipped,
                violations: fast,
                summary,
            };
        }

        let mut runtime = Runtime::new(self.config.clone().with_timeout(selection.timeout));
        if let Some(resolvers) = &self.resolvers {
            runtime = runtime.with_resolvers(resolvers.clone());
        }

        let result = runtime.run(ctx, selection.plans.clone()).await;

        let runtime_summary = SkipSummary::from_skipped(&result.skipped);
        runtime_summary.log();

        skipped.extend(result.skipped.iter().cloned());
        let violations = merge_async_violations(fast, Some(&result));
        let summary = SkipSummary::from_skipped(&skipped);

        SessionOutcome {
            result: Some(result),
            plans: selection.plans,
            skipped,
            violations,
            summary,
        }
    }
}
