use anyhow::Context;
use business_loader::config::PipelineConfig;
use business_loader::constants::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
use business_loader::storage::{BusinessQuery, StoreReader};
use business_loader::{logging, metrics, Pipeline, PipelineResult, RunContext};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "business_loader")]
#[command(about = "Builds the Berlin business directory store from Gelbe Seiten exports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Pipeline configuration file (optional unless given explicitly)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and build the store
    Run {
        /// Primary line-delimited business export
        #[arg(long)]
        primary: Option<PathBuf>,
        /// Category mapping JSON array
        #[arg(long)]
        categories: Option<PathBuf>,
        /// Precise line-delimited participant export
        #[arg(long)]
        precise: Option<PathBuf>,
        /// Skip the precise enrichment pass
        #[arg(long, conflicts_with = "precise")]
        skip_precise: bool,
        /// Output store file
        #[arg(long)]
        store: Option<PathBuf>,
        /// Rows per committed transaction
        #[arg(long)]
        batch_size: Option<usize>,
        /// Delete an existing store before building
        #[arg(long)]
        fresh: bool,
        /// Write a Prometheus text snapshot here when the run ends
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
    /// Show the statistics of an existing store
    Stats {
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Query an existing store
    Search {
        #[arg(long)]
        store: Option<PathBuf>,
        /// Substring of the business name
        #[arg(long)]
        name: Option<String>,
        /// Substring of the category list
        #[arg(long)]
        category: Option<String>,
        /// Exact city
        #[arg(long)]
        city: Option<String>,
        /// Full-text search over name and categories instead of filters
        #[arg(long, conflicts_with_all = ["name", "category", "city"])]
        text: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Print one business as JSON
    Show {
        id: String,
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    // An explicit path must exist; the default file is optional
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    PipelineConfig::load(&path, required)
        .with_context(|| format!("loading configuration from {}", path.display()))
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 Pipeline Results (run {}):", result.run_id);
    println!(
        "   Categories: {} names from {} entries ({} collisions)",
        result.categories.names, result.categories.entries, result.categories.collisions
    );
    println!(
        "   Extracted: {} of {} lines ({} malformed, {} missing name, {} outside area)",
        result.extract.emitted,
        result.extract.lines_seen,
        result.extract.malformed,
        result.extract.missing_name,
        result.extract.out_of_area
    );
    println!(
        "   Geocoded: {} ({} without centroid, {} unmapped postal codes)",
        result.geocode.geocoded,
        result.geocode.missing_records,
        result.geocode.missing_postal_codes.len()
    );
    match &result.precise {
        Some(p) => println!(
            "   Precise: {} businesses ({} with coordinates, {} malformed lines)",
            p.overrides, p.with_coordinates, p.malformed
        ),
        None => println!("   Precise: skipped"),
    }
    println!(
        "   Stored: {} rows ({} write errors), {} overrides applied, {} unmatched",
        result.store.written,
        result.store.write_errors,
        result.store.overrides_applied,
        result.store.unmatched_overrides
    );
    println!(
        "   Store: {} ({} businesses, {} geocoded)",
        result.store_path.display(),
        result.statistics.total_businesses,
        result.statistics.geocoded_businesses
    );
    println!("   Duration: {:.1}s", result.duration_secs);
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    let _guard = logging::init_logging(&config.logging);
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Run {
            primary,
            categories,
            precise,
            skip_precise,
            store,
            batch_size,
            fresh,
            metrics_out,
        } => {
            if let Some(p) = primary {
                config.sources.primary = p;
            }
            if let Some(p) = categories {
                config.sources.categories = p;
            }
            if let Some(p) = precise {
                config.sources.precise = Some(p);
            }
            if skip_precise {
                config.sources.precise = None;
            }
            if let Some(p) = store {
                config.store.path = p;
            }
            if let Some(n) = batch_size {
                config.store.batch_size = n;
            }
            if fresh {
                config.store.fresh = true;
            }

            metrics::init_metrics();
            let ctx = RunContext::new(config).context("invalid configuration")?;
            println!("🚀 Building business directory (run {})", ctx.run_id);

            let outcome = Pipeline::run(&ctx);

            // Snapshot even when the run failed, so partial counters are visible
            if let Some(path) = metrics_out {
                match metrics::render() {
                    Some(text) => {
                        fs::write(&path, text)
                            .with_context(|| format!("writing metrics to {}", path.display()))?;
                        info!("Metrics snapshot written to {}", path.display());
                    }
                    None => error!("Metrics recorder not installed, no snapshot written"),
                }
            }

            let result = outcome.context("pipeline run failed")?;
            print_summary(&result);
        }
        Commands::Stats { store } => {
            let path = store.unwrap_or(config.store.path);
            let reader = StoreReader::open(&path)?;
            let stats = reader.statistics()?;
            println!("📊 Statistics for {}:", path.display());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Search {
            store,
            name,
            category,
            city,
            text,
            limit,
            offset,
        } => {
            let path = store.unwrap_or(config.store.path);
            let reader = StoreReader::open(&path)?;
            let (records, total) = match text {
                Some(term) => {
                    let records = reader.full_text(&term, limit)?;
                    let total = records.len() as u64;
                    (records, total)
                }
                None => {
                    let query = BusinessQuery {
                        name,
                        category,
                        city,
                        geocoded_only: false,
                        limit,
                        offset,
                    };
                    (reader.search(&query)?, reader.count(&query)?)
                }
            };
            println!("🔎 {} of {} matching businesses:", records.len(), total);
            for r in &records {
                println!(
                    "   {}  {} ({} {}) [{}]",
                    r.id,
                    r.name,
                    r.postal_code,
                    r.city,
                    r.categories.join(", ")
                );
            }
        }
        Commands::Show { id, store } => {
            let path = store.unwrap_or(config.store.path);
            let reader = StoreReader::open(&path)?;
            match reader.get(&id)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => anyhow::bail!("no business with id {}", id),
            }
        }
    }

    Ok(())
}
