//! Fetch pipeline metrics.
//!
//! Counts are kept locally for the session report and mirrored to the
//! `metrics` facade. Without an installed recorder the facade calls are no-ops.

use std::cell::Cell;

use metrics::counter;
use serde::Serialize;

/// Counters for one coordinator.
#[derive(Debug, Default)]
pub struct FetchMetrics {
    requests: Cell<u64>,
    stale: Cell<u64>,
    applied: Cell<u64>,
    failures: Cell<u64>,
}

/// Point-in-time copy of [`FetchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub requests: u64,
    pub stale: u64,
    pub applied: u64,
    pub failures: u64,
}

fn bump(cell: &Cell<u64>) {
    cell.set(cell.get() + 1);
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issued data request
    pub fn record_request(&self, level: &str) {
        bump(&self.requests);
        counter!("census_requests_total", "level" => level.to_string()).increment(1);
    }

    /// Record a response discarded because a newer request was issued
    pub fn record_stale(&self) {
        bump(&self.stale);
        counter!("census_stale_responses_total").increment(1);
    }

    /// Record a layer replacement
    pub fn record_applied(&self) {
        bump(&self.applied);
        counter!("census_layers_applied_total").increment(1);
    }

    /// Record a render cycle abandoned with `kind`
    pub fn record_failure(&self, kind: &'static str) {
        bump(&self.failures);
        counter!("census_render_failures_total", "kind" => kind).increment(1);
    }

    pub fn snapshot(&self) -> FetchStats {
        FetchStats {
            requests: self.requests.get(),
            stale: self.stale.get(),
            applied: self.applied.get(),
            failures: self.failures.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = FetchMetrics::new();
        metrics.record_request("sa2");
        metrics.record_request("sa2");
        metrics.record_stale();
        metrics.record_applied();
        metrics.record_failure("NoData");

        assert_eq!(
            metrics.snapshot(),
            FetchStats {
                requests: 2,
                stale: 1,
                applied: 1,
                failures: 1
            }
        );
    }
}
