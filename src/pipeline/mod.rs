// Batch pipeline: categories -> extract -> geocode -> precise -> store

pub mod ingestion;
pub mod processing;

use crate::config::RunContext;
use crate::error::Result;
use crate::metrics::{self, EnrichMetrics, ExtractMetrics, StoreMetrics};
use crate::storage::{RunLineage, StoreBuilder, StoreStats};
use crate::types::{PrecisionOverrideMap, Statistics};
use processing::{
    CategoryIndexBuilder, CategoryIndexStats, CoordinateEnricher, ExtractStats, GeocodeStats,
    PreciseStats, PrecisionEnricher, RecordExtractor,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Everything a run reports, stage by stage.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub store_path: PathBuf,
    pub categories: CategoryIndexStats,
    pub extract: ExtractStats,
    pub geocode: GeocodeStats,
    /// `None` when no precise source is configured
    pub precise: Option<PreciseStats>,
    pub store: StoreStats,
    pub statistics: Statistics,
    pub duration_secs: f64,
}

pub struct Pipeline;

impl Pipeline {
    /// Run all five stages in order. Any stage error aborts the run.
    #[instrument(skip(ctx), fields(run_id = %ctx.run_id))]
    pub fn run(ctx: &RunContext) -> Result<PipelineResult> {
        let result = Self::run_stages(ctx);
        if let Err(e) = &result {
            error!("❌ Pipeline run {} failed: {}", ctx.run_id, e);
        }
        result
    }

    fn run_stages(ctx: &RunContext) -> Result<PipelineResult> {
        let sources = &ctx.config.sources;
        info!("🚀 Starting business directory build (run {})", ctx.run_id);
        let t_pipeline = Instant::now();

        // Step 1: category index
        let t = Instant::now();
        let (index, category_stats) = CategoryIndexBuilder::build(ctx, &sources.categories)?;
        metrics::record_stage_duration("categories", t.elapsed().as_secs_f64());
        ExtractMetrics::record_category_index(&category_stats);

        // Step 2: extraction
        let t = Instant::now();
        let (mut records, extract_stats) =
            RecordExtractor::new(ctx, &index).extract(ctx, &sources.primary)?;
        metrics::record_stage_duration("extract", t.elapsed().as_secs_f64());
        ExtractMetrics::record_extract(&extract_stats);
        drop(index);

        // Step 3: postal code centroids
        let t = Instant::now();
        let geocode_stats = CoordinateEnricher::new(ctx).enrich(ctx, &mut records);
        metrics::record_stage_duration("geocode", t.elapsed().as_secs_f64());
        EnrichMetrics::record_geocode(&geocode_stats);

        // Step 4: precise overrides, only when a source is configured
        let (overrides, precise_stats) = match &sources.precise {
            Some(path) => {
                let t = Instant::now();
                let (overrides, stats) = PrecisionEnricher::new(ctx).load(ctx, path)?;
                metrics::record_stage_duration("precise", t.elapsed().as_secs_f64());
                EnrichMetrics::record_precise(&stats);
                (overrides, Some(stats))
            }
            None => {
                info!("⏭️  No precise source configured, skipping precise enrichment");
                (PrecisionOverrideMap::new(), None)
            }
        };

        // Step 5: store
        let t = Instant::now();
        let lineage = RunLineage {
            run_id: ctx.run_id,
            started_at: ctx.started_at,
            primary: extract_stats.fingerprint.clone(),
            categories: category_stats.fingerprint.clone(),
            precise: precise_stats.as_ref().map(|s| s.fingerprint.clone()),
        };
        let builder = StoreBuilder::open(ctx)?;
        let store_path = builder.path().to_path_buf();
        let (store_stats, statistics) = builder.build(ctx, &records, &overrides, &lineage)?;
        metrics::record_stage_duration("store", t.elapsed().as_secs_f64());
        StoreMetrics::record_build(&store_stats);
        StoreMetrics::record_statistics(statistics.total_businesses, statistics.geocoded_businesses);

        let duration_secs = t_pipeline.elapsed().as_secs_f64();
        info!(
            "🎉 Build complete in {:.1}s: {} businesses stored, {} geocoded",
            duration_secs, statistics.total_businesses, statistics.geocoded_businesses
        );

        Ok(PipelineResult {
            run_id: ctx.run_id.to_string(),
            store_path,
            categories: category_stats,
            extract: extract_stats,
            geocode: geocode_stats,
            precise: precise_stats,
            store: store_stats,
            statistics,
            duration_secs,
        })
    }
}
