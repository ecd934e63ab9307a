//! Coarse and precise enrichment metrics.

use crate::metrics::{phase_metric, PhaseMetrics};
use crate::pipeline::processing::geocode::GeocodeStats;
use crate::pipeline::processing::precise::PreciseStats;

pub struct EnrichMetrics;

impl EnrichMetrics {
    pub fn record_geocode(stats: &GeocodeStats) {
        ::metrics::counter!(phase_metric!(counter, "enrich", "geocoded")).increment(stats.geocoded);
        ::metrics::counter!(phase_metric!(counter, "enrich", "records_without_centroid"))
            .increment(stats.missing_records);
        ::metrics::gauge!(phase_metric!(gauge, "enrich", "unmapped_postal_codes"))
            .set(stats.missing_postal_codes.len() as f64);
    }

    pub fn record_precise(stats: &PreciseStats) {
        ::metrics::counter!(phase_metric!(counter, "precise", "lines")).increment(stats.lines_seen);
        ::metrics::counter!(phase_metric!(counter, "precise", "malformed")).increment(stats.malformed);
        ::metrics::counter!(phase_metric!(counter, "precise", "missing_id"))
            .increment(stats.missing_id);
        ::metrics::gauge!(phase_metric!(gauge, "precise", "overrides")).set(stats.overrides as f64);
        ::metrics::counter!(phase_metric!(counter, "precise", "with_coordinates"))
            .increment(stats.with_coordinates);
    }
}

impl PhaseMetrics for EnrichMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = counter!(phase_metric!(counter, "enrich", "geocoded"));
        let _ = counter!(phase_metric!(counter, "enrich", "records_without_centroid"));
        let _ = gauge!(phase_metric!(gauge, "enrich", "unmapped_postal_codes"));
        let _ = counter!(phase_metric!(counter, "precise", "lines"));
        let _ = counter!(phase_metric!(counter, "precise", "malformed"));
        let _ = counter!(phase_metric!(counter, "precise", "missing_id"));
        let _ = gauge!(phase_metric!(gauge, "precise", "overrides"));
        let _ = counter!(phase_metric!(counter, "precise", "with_coordinates"));
    }

    fn phase_name() -> &'static str {
        "enrich"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn geocode_counters_use_centroid_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let stats = GeocodeStats {
            processed: 3,
            geocoded: 1,
            missing_records: 2,
            missing_postal_codes: ["10999".to_string()].into_iter().collect(),
        };

        ::metrics::with_local_recorder(&recorder, || EnrichMetrics::record_geocode(&stats));
        let text = handle.render();

        assert!(text.contains("biz_enrich_geocoded_total 1"));
        assert!(text.contains("biz_enrich_records_without_centroid_total 2"));
        assert!(text.contains("biz_enrich_unmapped_postal_codes 1"));
        assert!(!text.contains("missing_coordinate"));
    }
}
