use proptest::prelude::*;

/// Dedupe keys drawn from a small alphabet so batches contain duplicates
pub fn dedupe_key_strategy() -> impl Strategy<Value = String> {
    "[a-d]{1,2}"
}

/// Optional per-request timeouts in milliseconds, including zero
pub fn timeout_ms_strategy() -> impl Strategy<Value = Option<u64>> {
    prop::option::of(0u64..5_000)
}

/// A batch of (key, timeout) pairs
pub fn batch_strategy() -> impl Strategy<Value = Vec<(String, Option<u64>)>> {
    prop::collection::vec((dedupe_key_strategy(), timeout_ms_strategy()), 0..40)
}
