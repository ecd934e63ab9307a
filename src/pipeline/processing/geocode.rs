use crate::config::RunContext;
use crate::reference::postal_centroids;
use crate::types::BusinessRecord;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default, Clone, Serialize)]
pub struct GeocodeStats {
    pub processed: u64,
    pub geocoded: u64,
    pub missing_records: u64,
    /// Distinct postal codes with no centroid
    pub missing_postal_codes: BTreeSet<String>,
}

/// Coarse enrichment: every record whose postal code is in the reference
/// table gets that area's centroid. Never touches the network.
pub struct CoordinateEnricher {
    progress_every: u64,
}

impl CoordinateEnricher {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            progress_every: ctx.config.enrich.progress_every,
        }
    }

    #[instrument(skip_all, fields(run_id = %ctx.run_id, records = records.len()))]
    pub fn enrich(&self, ctx: &RunContext, records: &mut [BusinessRecord]) -> GeocodeStats {
        info!(
            "🗺️  Assigning postal code centroids ({} codes in reference table)",
            postal_centroids::table_size()
        );
        let total = records.len();
        let mut stats = GeocodeStats::default();

        for record in records.iter_mut() {
            match postal_centroids::centroid_for(&record.postal_code) {
                Some(centroid) => {
                    record.coordinate = Some(centroid);
                    stats.geocoded += 1;
                }
                None => {
                    record.coordinate = None;
                    stats.missing_records += 1;
                    stats.missing_postal_codes.insert(record.postal_code.clone());
                }
            }
            stats.processed += 1;
            if stats.processed % self.progress_every == 0 {
                info!("Progress: {}/{} businesses geocoded", stats.processed, total);
            }
        }

        let rate = if total == 0 {
            0.0
        } else {
            stats.geocoded as f64 / total as f64 * 100.0
        };
        info!(
            "✅ Geocoding complete: {} with centroid, {} without ({:.1}% success)",
            stats.geocoded, stats.missing_records, rate
        );
        if !stats.missing_postal_codes.is_empty() {
            warn!(
                "{} distinct postal codes have no centroid",
                stats.missing_postal_codes.len()
            );
            debug!(
                "Unmapped postal codes (first 20): {:?}",
                stats.missing_postal_codes.iter().take(20).collect::<Vec<_>>()
            );
        }
        stats
    }
}
