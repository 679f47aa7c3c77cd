//! # Slow Check Types
//!
//! Requests, resolved values, handler outputs and run results exchanged between
//! lint rules and the [`Runtime`](crate::checks::Runtime).
//!
//! Inputs, resolved values and handler outputs are closed tagged unions so that
//! handlers dispatch exhaustively instead of down-casting opaque values.

use crate::checks::errors::ResolveError;
use crate::image::{ImageConfig, ImageRequest, PlatformMismatch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Kind of I/O a check request requires (reserved for per-category routing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Network,
    Filesystem,
    Console,
}

/// Resolver-specific input carried by a [`CheckRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "input", rename_all = "snake_case")]
pub enum ResolveInput {
    /// Image reference + platform for the registry resolver
    Image(ImageRequest),
    /// Free-form input for resolvers outside the built-in set
    Json(serde_json::Value),
}

impl ResolveInput {
    pub fn as_image(&self) -> Option<&ImageRequest> {
        match self {
            ResolveInput::Image(request) => Some(request),
            ResolveInput::Json(_) => None,
        }
    }
}

/// Value produced by a resolver and shared by every handler of a dedupe group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedValue {
    /// Image metadata fetched from a registry
    Image(ImageConfig),
    /// Image exists but has no manifest for the requested platform
    PlatformMismatch(PlatformMismatch),
    /// Free-form value for resolvers outside the built-in set
    Json(serde_json::Value),
}

impl ResolvedValue {
    pub fn as_image(&self) -> Option<&ImageConfig> {
        match self {
            ResolvedValue::Image(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_platform_mismatch(&self) -> Option<&PlatformMismatch> {
        match self {
            ResolvedValue::PlatformMismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResolvedValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Style,
}

/// A lint finding produced by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_code: String,
    pub file: String,
    pub stage_index: usize,
    /// 1-based line, when the rule can point at one
    pub line: Option<u32>,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    pub fn new(
        rule_code: impl Into<String>,
        file: impl Into<String>,
        stage_index: usize,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            rule_code: rule_code.into(),
            file: file.into(),
            stage_index,
            line: None,
            message: message.into(),
            severity,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub(crate) fn triple(&self) -> (&str, &str, usize) {
        (&self.rule_code, &self.file, self.stage_index)
    }
}

/// Marks a (rule, file, stage) triple whose slow check resolved, even with no
/// findings. Fast-path violations for these triples are superseded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletedCheck {
    pub rule_code: String,
    pub file: String,
    pub stage_index: usize,
}

impl CompletedCheck {
    pub fn new(rule_code: impl Into<String>, file: impl Into<String>, stage_index: usize) -> Self {
        Self {
            rule_code: rule_code.into(),
            file: file.into(),
            stage_index,
        }
    }

    pub(crate) fn triple(&self) -> (&str, &str, usize) {
        (&self.rule_code, &self.file, self.stage_index)
    }
}

/// One item produced by a [`ResultHandler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutput {
    Violation(Violation),
    /// Extra completion, e.g. for a descendant stage rechecked through inheritance
    Completed(CompletedCheck),
}

impl From<Violation> for HandlerOutput {
    fn from(violation: Violation) -> Self {
        HandlerOutput::Violation(violation)
    }
}

impl From<CompletedCheck> for HandlerOutput {
    fn from(completed: CompletedCheck) -> Self {
        HandlerOutput::Completed(completed)
    }
}

/// Converts a resolved value into findings.
///
/// - `None`: the handler could not interpret the value; its request is **not**
///   marked completed.
/// - `Some(outputs)` (possibly empty): processed; the request is marked
///   completed and replaces fast-path findings.
pub trait ResultHandler: Send + Sync {
    fn on_success(&self, resolved: &ResolvedValue) -> Option<Vec<HandlerOutput>>;
}

impl<F> ResultHandler for F
where
    F: Fn(&ResolvedValue) -> Option<Vec<HandlerOutput>> + Send + Sync,
{
    fn on_success(&self, resolved: &ResolvedValue) -> Option<Vec<HandlerOutput>> {
        self(resolved)
    }
}

/// A planned unit of slow work
#[derive(Clone)]
pub struct CheckRequest {
    /// Rule that created this request
    pub rule_code: String,
    pub category: Category,
    /// Fully specific dedupe key (ref + platform + options)
    pub key: String,
    /// Routes to a registered resolver
    pub resolver_id: String,
    pub data: ResolveInput,
    /// Per-request budget; `None` or zero means the run budget only
    pub timeout: Option<Duration>,
    pub handler: Arc<dyn ResultHandler>,
    /// Reporting metadata, never part of dedup
    pub file: String,
    pub stage_index: usize,
}

impl CheckRequest {
    pub fn new(
        rule_code: impl Into<String>,
        resolver_id: impl Into<String>,
        key: impl Into<String>,
        data: ResolveInput,
        handler: Arc<dyn ResultHandler>,
    ) -> Self {
        Self {
            rule_code: rule_code.into(),
            category: Category::Network,
            key: key.into(),
            resolver_id: resolver_id.into(),
            data,
            timeout: None,
            handler,
            file: String::new(),
            stage_index: 0,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, stage_index: usize) -> Self {
        self.file = file.into();
        self.stage_index = stage_index;
        self
    }

    pub fn resolution_key(&self) -> ResolutionKey {
        ResolutionKey::new(self.resolver_id.clone(), self.key.clone())
    }

    pub fn completed_check(&self) -> CompletedCheck {
        CompletedCheck::new(self.rule_code.clone(), self.file.clone(), self.stage_index)
    }
}

impl fmt::Debug for CheckRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRequest")
            .field("rule_code", &self.rule_code)
            .field("category", &self.category)
            .field("key", &self.key)
            .field("resolver_id", &self.resolver_id)
            .field("data", &self.data)
            .field("timeout", &self.timeout)
            .field("file", &self.file)
            .field("stage_index", &self.stage_index)
            .finish_non_exhaustive()
    }
}

/// Identifies one unique unit of resolvable work: (resolver id, dedupe key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolutionKey {
    pub resolver_id: String,
    pub key: String,
}

impl ResolutionKey {
    pub fn new(resolver_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            resolver_id: resolver_id.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resolver_id, self.key)
    }
}

/// Why a planned check did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Disabled,
    FailFast,
    Auth,
    NotFound,
    Network,
    Timeout,
    ResolverError,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "disabled",
            SkipReason::FailFast => "fail-fast",
            SkipReason::Auth => "auth",
            SkipReason::NotFound => "not-found",
            SkipReason::Network => "network",
            SkipReason::Timeout => "timeout",
            SkipReason::ResolverError => "resolver-error",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A check that was planned but not completed
#[derive(Debug, Clone)]
pub struct Skipped {
    pub request: CheckRequest,
    pub reason: SkipReason,
    /// Shared by every request of the failing dedupe group
    pub error: Option<Arc<ResolveError>>,
}

impl Skipped {
    pub fn new(request: CheckRequest, reason: SkipReason) -> Self {
        Self {
            request,
            reason,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Arc<ResolveError>) -> Self {
        self.error = Some(error);
        self
    }
}

/// Output of one runtime execution. Ordering across dedupe groups is unspecified.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub violations: Vec<Violation>,
    pub skipped: Vec<Skipped>,
    /// Every (rule, file, stage) that resolved successfully
    pub completed: Vec<CompletedCheck>,
    /// Every successfully resolved value, keyed by resolution key
    pub resolved: HashMap<ResolutionKey, Arc<ResolvedValue>>,
}

impl RunResult {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
            && self.skipped.is_empty()
            && self.completed.is_empty()
            && self.resolved.is_empty()
    }

    pub fn skipped_with(&self, reason: SkipReason) -> impl Iterator<Item = &Skipped> {
        self.skipped.iter().filter(move |s| s.reason == reason)
    }
}
