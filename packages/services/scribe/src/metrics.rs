use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

// Process-wide batch counters
pub static BATCHES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static VALID_MESSAGES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static INVALID_MESSAGES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static OPERATIONS_WRITTEN: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static SINK_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

pub fn record_batch(valid: u64, invalid: u64) {
    BATCHES.fetch_add(1, Ordering::Relaxed);
    VALID_MESSAGES.fetch_add(valid, Ordering::Relaxed);
    INVALID_MESSAGES.fetch_add(invalid, Ordering::Relaxed);
}
pub fn record_operations_written(n: u64) { OPERATIONS_WRITTEN.fetch_add(n, Ordering::Relaxed); }
pub fn record_sink_failure() { SINK_FAILURES.fetch_add(1, Ordering::Relaxed); }

pub fn export_metrics_json() -> serde_json::Value {
    serde_json::json!({
        "batches": BATCHES.load(Ordering::Relaxed),
        "messages": {
            "valid": VALID_MESSAGES.load(Ordering::Relaxed),
            "invalid": INVALID_MESSAGES.load(Ordering::Relaxed),
        },
        "operations_written": OPERATIONS_WRITTEN.load(Ordering::Relaxed),
        "sink_failures": SINK_FAILURES.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exported() {
        let before = export_metrics_json();
        record_batch(3, 1);
        record_operations_written(5);
        let after = export_metrics_json();
        // other tests may bump the counters concurrently
        assert!(after["batches"].as_u64().unwrap() >= before["batches"].as_u64().unwrap() + 1);
        assert!(after["messages"]["valid"].as_u64().unwrap() >= before["messages"]["valid"].as_u64().unwrap() + 3);
        assert!(after["operations_written"].as_u64().unwrap() >= before["operations_written"].as_u64().unwrap() + 5);
    }
}
