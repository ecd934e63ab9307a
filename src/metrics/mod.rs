//! Run metrics for the loader
//!
//! Each pipeline phase defines its own counters in a dedicated submodule.
//! The recorder is in-process only: a batch run renders a Prometheus text
//! snapshot at the end instead of serving a scrape endpoint.

/// biz_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("biz_", $phase, "_", $name, "_total")
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("biz_", $phase, "_", $name)
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("biz_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

pub mod enrich;
pub mod extract;
pub mod store;

pub use enrich::EnrichMetrics;
pub use extract::ExtractMetrics;
pub use store::StoreMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global recorder and register every phase's metrics.
///
/// Idempotent. Without a call to this, all metric macros are no-ops.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("METRICS: recorder handle was already stored");
            }
            ExtractMetrics::register_metrics();
            EnrichMetrics::register_metrics();
            StoreMetrics::register_metrics();
            info!(
                "Prometheus recorder installed for phases: {}, {}, {}",
                ExtractMetrics::phase_name(),
                EnrichMetrics::phase_name(),
                StoreMetrics::phase_name()
            );
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
}

/// Prometheus text exposition of everything recorded so far.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Wall-clock duration of one pipeline stage.
pub fn record_stage_duration(stage: &'static str, secs: f64) {
    ::metrics::histogram!(phase_metric!(histogram, "pipeline", "stage_duration_seconds"), "stage" => stage)
        .record(secs);
}

/// Phase-specific metrics collections register their metrics up front so a
/// snapshot always lists them, even at zero.
pub trait PhaseMetrics {
    fn register_metrics();

    fn phase_name() -> &'static str;
}
