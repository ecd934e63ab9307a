//! Category index and record extraction metrics.

use crate::metrics::{phase_metric, PhaseMetrics};
use crate::pipeline::processing::categories::CategoryIndexStats;
use crate::pipeline::processing::extract::ExtractStats;

pub struct ExtractMetrics;

impl ExtractMetrics {
    pub fn record_category_index(stats: &CategoryIndexStats) {
        ::metrics::gauge!(phase_metric!(gauge, "categories", "names")).set(stats.names as f64);
        ::metrics::counter!(phase_metric!(counter, "categories", "collisions"))
            .increment(stats.collisions);
        ::metrics::counter!(phase_metric!(counter, "categories", "skipped_entries"))
            .increment(stats.skipped_entries + stats.invalid_entries);
    }

    pub fn record_extract(stats: &ExtractStats) {
        ::metrics::counter!(phase_metric!(counter, "extract", "lines")).increment(stats.lines_seen);
        ::metrics::counter!(phase_metric!(counter, "extract", "emitted")).increment(stats.emitted);
        ::metrics::counter!(phase_metric!(counter, "extract", "malformed")).increment(stats.malformed);
        ::metrics::counter!(phase_metric!(counter, "extract", "missing_name"))
            .increment(stats.missing_name);
        ::metrics::counter!(phase_metric!(counter, "extract", "missing_id"))
            .increment(stats.missing_id);
        ::metrics::counter!(phase_metric!(counter, "extract", "out_of_area"))
            .increment(stats.out_of_area);
    }
}

impl PhaseMetrics for ExtractMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = gauge!(phase_metric!(gauge, "categories", "names"));
        let _ = counter!(phase_metric!(counter, "categories", "collisions"));
        let _ = counter!(phase_metric!(counter, "categories", "skipped_entries"));
        let _ = counter!(phase_metric!(counter, "extract", "lines"));
        let _ = counter!(phase_metric!(counter, "extract", "emitted"));
        let _ = counter!(phase_metric!(counter, "extract", "malformed"));
        let _ = counter!(phase_metric!(counter, "extract", "missing_name"));
        let _ = counter!(phase_metric!(counter, "extract", "missing_id"));
        let _ = counter!(phase_metric!(counter, "extract", "out_of_area"));
    }

    fn phase_name() -> &'static str {
        "extract"
    }
}
