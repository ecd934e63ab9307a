//! Store build metrics.

use crate::metrics::{phase_metric, PhaseMetrics};
use crate::storage::builder::StoreStats;

pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_build(stats: &StoreStats) {
        ::metrics::counter!(phase_metric!(counter, "store", "rows_written")).increment(stats.written);
        ::metrics::counter!(phase_metric!(counter, "store", "write_errors"))
            .increment(stats.write_errors);
        ::metrics::counter!(phase_metric!(counter, "store", "overrides_applied"))
            .increment(stats.overrides_applied);
        ::metrics::counter!(phase_metric!(counter, "store", "batches_committed"))
            .increment(stats.batches_committed);
    }

    pub fn record_statistics(total: u64, geocoded: u64) {
        ::metrics::gauge!(phase_metric!(gauge, "store", "total_businesses")).set(total as f64);
        ::metrics::gauge!(phase_metric!(gauge, "store", "geocoded_businesses")).set(geocoded as f64);
    }
}

impl PhaseMetrics for StoreMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = counter!(phase_metric!(counter, "store", "rows_written"));
        let _ = counter!(phase_metric!(counter, "store", "write_errors"));
        let _ = counter!(phase_metric!(counter, "store", "overrides_applied"));
        let _ = counter!(phase_metric!(counter, "store", "batches_committed"));
        let _ = gauge!(phase_metric!(gauge, "store", "total_businesses"));
        let _ = gauge!(phase_metric!(gauge, "store", "geocoded_businesses"));
    }

    fn phase_name() -> &'static str {
        "store"
    }
}
