//! Summary notes for skipped slow checks.

use crate::checks::types::{SkipReason, Skipped};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Runtime reasons reported to users, in display order
const NOTE_ORDER: [(SkipReason, &str); 5] = [
    (SkipReason::Timeout, "timed out (increase --slow-checks-timeout)"),
    (SkipReason::Network, "skipped (registry unreachable or rate-limited)"),
    (SkipReason::Auth, "skipped (authentication failed)"),
    (SkipReason::NotFound, "skipped (image not found)"),
    (SkipReason::ResolverError, "skipped due to errors"),
];

/// Skipped checks counted per reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipSummary {
    counts: BTreeMap<SkipReason, usize>,
}

impl SkipSummary {
    pub fn from_skipped<'a>(skipped: impl IntoIterator<Item = &'a Skipped>) -> Self {
        let mut counts = BTreeMap::new();
        for entry in skipped {
            *counts.entry(entry.reason).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, reason: SkipReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// One note per runtime reason with a non-zero count. Filter-time reasons
    /// (`disabled`, `fail-fast`) have no note here.
    pub fn notes(&self) -> Vec<String> {
        NOTE_ORDER
            .iter()
            .filter_map(|(reason, text)| {
                let n = self.count(*reason);
                (n > 0).then(|| format!("{n} slow check(s) {text}"))
            })
            .collect()
    }

    pub fn log(&self) {
        for note in self.notes() {
            warn!("{note}");
        }
    }
}
