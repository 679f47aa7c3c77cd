//! # Slow Check Runtime
//!
//! Executes a batch of [`CheckRequest`]s under a concurrency cap and a
//! wall-clock budget.
//!
//! ## Execution model
//!
//! 1. Requests are grouped by [`ResolutionKey`]. Each group resolves once and
//!    fans the outcome out to every requester's handler, in input order.
//! 2. One task per group acquires a semaphore slot, racing the run context.
//!    A group whose context finishes first is skipped as `timeout` without
//!    touching its resolver.
//! 3. The resolver runs under a child context bounded by the group's widest
//!    per-request timeout and the run deadline, whichever is tighter.
//! 4. Failures are classified and reported once per original request;
//!    successes feed each handler and mark its request completed.
//!
//! All per-run state (cache, semaphore, output buffers) lives for one
//! [`Runtime::run`] call. Result ordering across groups is unspecified.

use crate::checks::context::CheckContext;
use crate::checks::error_classifier::classify_error;
use crate::checks::errors::ResolveError;
use crate::checks::types::{
    CheckRequest, HandlerOutput, ResolutionKey, ResolvedValue, RunResult, SkipReason, Skipped,
};
use crate::config::duration;
use crate::constants::DEFAULT_CONCURRENCY;
use crate::registry::ResolverRegistry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum concurrent resolver invocations; 0 means the default (4).
    /// Values above [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub concurrency: usize,
    /// Global budget for one run; zero means bounded by the caller's context only
    #[serde(with = "duration::serde_duration")]
    pub timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::ZERO,
        }
    }
}

impl RuntimeConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.concurrency.min(Semaphore::MAX_PERMITS)
        }
    }
}

/// Requests sharing one [`ResolutionKey`]
#[derive(Debug, Clone)]
pub struct RequestGroup {
    key: ResolutionKey,
    representative: CheckRequest,
    requests: Vec<CheckRequest>,
}

impl RequestGroup {
    pub fn key(&self) -> &ResolutionKey {
        &self.key
    }

    /// Request that drives the resolver call; carries the group's widest timeout
    pub fn representative(&self) -> &CheckRequest {
        &self.representative
    }

    /// Original requests in input order
    pub fn requests(&self) -> &[CheckRequest] {
        &self.requests
    }
}

/// Group requests by resolution key, keeping first-seen key order
pub fn group_requests(requests: Vec<CheckRequest>) -> Vec<RequestGroup> {
    let mut index: HashMap<ResolutionKey, usize> = HashMap::new();
    let mut groups: Vec<RequestGroup> = Vec::new();

    for request in requests {
        let key = request.resolution_key();
        match index.get(&key) {
            Some(&position) => {
                let group = &mut groups[position];
                group.representative.timeout =
                    widest_timeout(group.representative.timeout, request.timeout);
                group.requests.push(request);
            }
            None => {
                index.insert(key.clone(), groups.len());
                let mut representative = request.clone();
                representative.timeout = widest_timeout(None, request.timeout);
                groups.push(RequestGroup {
                    key,
                    representative,
                    requests: vec![request],
                });
            }
        }
    }

    groups
}

/// Zero timeouts count as unset; an unset timeout never loosens a set one
fn widest_timeout(current: Option<Duration>, candidate: Option<Duration>) -> Option<Duration> {
    let candidate = candidate.filter(|t| !t.is_zero());
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

type ResolveOutcome = Result<Arc<ResolvedValue>, Arc<ResolveError>>;

/// State shared by the tasks of one run
struct RunState {
    ctx: CheckContext,
    resolvers: Arc<ResolverRegistry>,
    semaphore: Arc<Semaphore>,
    cache: Mutex<HashMap<ResolutionKey, ResolveOutcome>>,
    output: Mutex<RunResult>,
}

/// Executes slow checks
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    config: RuntimeConfig,
    resolvers: Option<Arc<ResolverRegistry>>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            resolvers: None,
        }
    }

    /// Use a private registry instead of the global one
    pub fn with_resolvers(mut self, resolvers: Arc<ResolverRegistry>) -> Self {
        self.resolvers = Some(resolvers);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Execute all requests. Never fails: every request ends up completed,
    /// skipped, or both absent when its handler declined the value.
    #[instrument(skip(self, ctx, requests), fields(request_count = requests.len()))]
    pub async fn run(&self, ctx: &CheckContext, requests: Vec<CheckRequest>) -> RunResult {
        if requests.is_empty() {
            return RunResult::default();
        }

        let run_ctx = if self.config.timeout.is_zero() {
            ctx.clone()
        } else {
            ctx.with_timeout(self.config.timeout)
        };

        let groups = group_requests(requests);
        let concurrency = self.config.effective_concurrency();
        debug!(
            groups = groups.len(),
            concurrency = concurrency,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "Starting slow check run"
        );

        let state = Arc::new(RunState {
            ctx: run_ctx,
            resolvers: self
                .resolvers
                .clone()
                .unwrap_or_else(ResolverRegistry::global),
            semaphore: Arc::new(Semaphore::new(concurrency)),
            cache: Mutex::new(HashMap::new()),
            output: Mutex::new(RunResult::default()),
        });

        let mut handles = Vec::with_capacity(groups.len());
        for group in groups {
            let attribution = group.requests.clone();
            let task_state = state.clone();
            let handle = tokio::spawn(async move { execute_group(task_state, group).await });
            handles.push((handle, attribution));
        }

        for (handle, attribution) in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Slow check task failed");
                let error = Arc::new(ResolveError::Other(anyhow::anyhow!(
                    "slow check task failed: {e}"
                )));
                let mut output = state.output.lock();
                for request in attribution {
                    output.skipped.push(
                        Skipped::new(request, SkipReason::ResolverError).with_error(error.clone()),
                    );
                }
            }
        }

        let result = std::mem::take(&mut *state.output.lock());
        info!(
            violations = result.violations.len(),
            completed = result.completed.len(),
            skipped = result.skipped.len(),
            resolved = result.resolved.len(),
            "Slow check run completed"
        );
        result
    }
}

async fn execute_group(state: Arc<RunState>, group: RequestGroup) {
    let key = group.key.clone();

    let permit = tokio::select! {
        biased;
        _ = state.ctx.done() => None,
        permit = state.semaphore.clone().acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        debug!(key = %key, "Run context finished before a slot was free");
        let error = Arc::new(state.ctx.err().unwrap_or(ResolveError::DeadlineExceeded));
        let mut output = state.output.lock();
        for request in group.requests {
            output
                .skipped
                .push(Skipped::new(request, SkipReason::Timeout).with_error(error.clone()));
        }
        return;
    };

    let cached = state.cache.lock().get(&key).cloned();
    let outcome = match cached {
        Some(outcome) => outcome,
        None => {
            let outcome = resolve_group(&state, &group).await;
            state.cache.lock().insert(key.clone(), outcome.clone());
            outcome
        }
    };

    match outcome {
        Err(error) => {
            let reason = classify_error(&error);
            debug!(key = %key, reason = %reason, error = %error, "Slow check group skipped");
            let mut output = state.output.lock();
            for request in group.requests {
                output
                    .skipped
                    .push(Skipped::new(request, reason).with_error(error.clone()));
            }
        }
        Ok(value) => deliver(&state, &key, group.requests, value),
    }
}

async fn resolve_group(state: &RunState, group: &RequestGroup) -> ResolveOutcome {
    let request = &group.representative;
    let Some(resolver) = state.resolvers.get(&request.resolver_id) else {
        warn!(
            resolver_id = %request.resolver_id,
            rule_code = %request.rule_code,
            "No resolver registered for slow check"
        );
        return Err(Arc::new(ResolveError::UnknownResolver {
            resolver_id: request.resolver_id.clone(),
        }));
    };

    let ctx = match request.timeout {
        Some(timeout) if !timeout.is_zero() => state.ctx.with_timeout(timeout),
        _ => state.ctx.clone(),
    };

    debug!(key = %group.key, "Invoking resolver");
    resolver
        .resolve(&ctx, &request.data)
        .await
        .map(Arc::new)
        .map_err(Arc::new)
}

fn deliver(
    state: &RunState,
    key: &ResolutionKey,
    requests: Vec<CheckRequest>,
    value: Arc<ResolvedValue>,
) {
    let mut completed = Vec::new();
    let mut violations = Vec::new();

    for request in &requests {
        let handled = catch_unwind(AssertUnwindSafe(|| request.handler.on_success(&value)));
        let outputs = match handled {
            Ok(Some(outputs)) => outputs,
            Ok(None) => continue,
            Err(_) => {
                error!(
                    rule_code = %request.rule_code,
                    file = %request.file,
                    key = %key,
                    "Slow check handler panicked"
                );
                continue;
            }
        };

        completed.push(request.completed_check());
        for output in outputs {
            match output {
                HandlerOutput::Violation(violation) => violations.push(violation),
                HandlerOutput::Completed(check) => completed.push(check),
            }
        }
    }

    let mut output = state.output.lock();
    output.completed.extend(completed);
    output.violations.extend(violations);
    output.resolved.insert(key.clone(), value);
}
