use crate::checks::types::{RunResult, Violation};
use std::collections::HashSet;

/// Combine fast-path violations with slow-check results.
///
/// Fast violations whose (rule, file, stage) completed a slow check are
/// replaced by the slow results. Other stages of the same file keep their
/// fast findings.
pub fn merge_async_violations(fast: Vec<Violation>, result: Option<&RunResult>) -> Vec<Violation> {
    let Some(result) = result else {
        return fast;
    };
    if result.completed.is_empty() && result.violations.is_empty() {
        return fast;
    }

    let completed: HashSet<(&str, &str, usize)> =
        result.completed.iter().map(|c| c.triple()).collect();

    let mut merged: Vec<Violation> = fast
        .into_iter()
        .filter(|v| !completed.contains(&v.triple()))
        .collect();
    merged.extend(result.violations.iter().cloned());
    merged
}
