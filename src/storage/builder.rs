use crate::config::RunContext;
use crate::constants::*;
use crate::error::{RecordError, Result};
use crate::pipeline::ingestion::SourceFingerprint;
use crate::storage::migrations;
use crate::types::{BusinessRecord, PrecisionOverride, PrecisionOverrideMap, Statistics};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Statement};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const UPSERT_SQL: &str = "
    INSERT INTO businesses (
        id, name, postal_code, city, lat, lon, categories, branch_ids,
        street_address, district, phone, email, website
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    ON CONFLICT(id) DO UPDATE SET
        name           = excluded.name,
        postal_code    = excluded.postal_code,
        city           = excluded.city,
        lat            = excluded.lat,
        lon            = excluded.lon,
        categories     = excluded.categories,
        branch_ids     = excluded.branch_ids,
        street_address = COALESCE(excluded.street_address, businesses.street_address),
        district       = COALESCE(excluded.district, businesses.district),
        phone          = COALESCE(excluded.phone, businesses.phone),
        email          = COALESCE(excluded.email, businesses.email),
        website        = COALESCE(excluded.website, businesses.website)";

// lat/lon are bound together, so they are either both replaced or both kept
const OVERRIDE_SQL: &str = "
    UPDATE businesses SET
        lat            = COALESCE(?2, lat),
        lon            = COALESCE(?3, lon),
        street_address = COALESCE(?4, street_address),
        district       = COALESCE(?5, district),
        phone          = COALESCE(?6, phone),
        email          = COALESCE(?7, email),
        website        = COALESCE(?8, website)
    WHERE id = ?1";

#[derive(Debug, Default, Clone, Serialize)]
pub struct StoreStats {
    pub written: u64,
    pub write_errors: u64,
    pub overrides_applied: u64,
    /// Override ids with no row in the store
    pub unmatched_overrides: u64,
    pub batches_committed: u64,
}

/// Provenance of one run, persisted to `pipeline_runs`.
#[derive(Debug, Clone, Serialize)]
pub struct RunLineage {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub primary: SourceFingerprint,
    pub categories: SourceFingerprint,
    pub precise: Option<SourceFingerprint>,
}

/// Sole writer of the business store for the duration of a run.
pub struct StoreBuilder {
    conn: Connection,
    path: PathBuf,
    batch_size: usize,
    schema_version: u32,
}

impl StoreBuilder {
    pub fn open(ctx: &RunContext) -> Result<Self> {
        let store = &ctx.config.store;
        Self::open_at(&store.path, ctx.batch_size(), store.fresh)
    }

    /// Open (or create) the store file and bring its schema up to date.
    pub fn open_at(path: &Path, batch_size: usize, fresh: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if fresh {
            remove_store_files(path)?;
        }

        let mut conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=FULL;
            "#,
        )?;
        let applied = migrations::run_migrations(&mut conn)?;
        let schema_version = migrations::current_version(&conn)?;
        info!(
            "🗄️  Store ready at {} (schema v{}, {} migrations applied)",
            path.display(),
            schema_version,
            applied
        );

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            batch_size: batch_size.max(1),
            schema_version,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every store step in order. Compaction is last.
    #[instrument(skip_all, fields(run_id = %ctx.run_id, records = records.len()))]
    pub fn build(
        mut self,
        ctx: &RunContext,
        records: &[BusinessRecord],
        overrides: &PrecisionOverrideMap,
        lineage: &RunLineage,
    ) -> Result<(StoreStats, Statistics)> {
        let mut stats = StoreStats::default();
        self.upsert_records(records, &mut stats)?;
        self.apply_overrides(overrides, &mut stats)?;
        self.rebuild_search_index()?;
        let statistics = self.recompute_statistics()?;
        self.record_run(lineage, &stats)?;
        self.compact()?;
        Ok((stats, statistics))
    }

    /// Insert-or-update every record, committing each `batch_size` rows.
    pub fn upsert_records(&mut self, records: &[BusinessRecord], stats: &mut StoreStats) -> Result<()> {
        info!("💾 Writing {} businesses (batch size {})", records.len(), self.batch_size);

        for chunk in records.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
                for record in chunk {
                    let categories = serde_json::to_string(&record.categories)?;
                    let branch_ids = serde_json::to_string(&record.branch_ids)?;
                    match upsert_one(&mut stmt, record, &categories, &branch_ids) {
                        Ok(()) => stats.written += 1,
                        Err(source) => {
                            let err = RecordError::StorageWrite {
                                id: record.id.clone(),
                                source,
                            };
                            warn!("{}", err);
                            stats.write_errors += 1;
                        }
                    }
                }
            }
            tx.commit()?;
            stats.batches_committed += 1;
            debug!("Committed batch {} ({} rows written so far)", stats.batches_committed, stats.written);
        }

        info!(
            "✅ Upsert complete: {} written, {} failed, {} batches",
            stats.written, stats.write_errors, stats.batches_committed
        );
        Ok(())
    }

    /// Update exactly the supplied fields of each overridden business.
    pub fn apply_overrides(&mut self, overrides: &PrecisionOverrideMap, stats: &mut StoreStats) -> Result<()> {
        if overrides.is_empty() {
            debug!("No precise overrides to apply");
            return Ok(());
        }
        info!("📍 Applying {} precise overrides", overrides.len());

        // Sorted so batch boundaries do not depend on hash order
        let mut ids: Vec<&String> = overrides.keys().collect();
        ids.sort();

        for chunk in ids.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(OVERRIDE_SQL)?;
                for id in chunk {
                    match apply_one(&mut stmt, id, &overrides[*id]) {
                        Ok(0) => stats.unmatched_overrides += 1,
                        Ok(_) => stats.overrides_applied += 1,
                        Err(source) => {
                            let err = RecordError::StorageWrite {
                                id: (*id).clone(),
                                source,
                            };
                            warn!("{}", err);
                            stats.write_errors += 1;
                        }
                    }
                }
            }
            tx.commit()?;
            stats.batches_committed += 1;
        }

        info!(
            "✅ Overrides applied: {} updated, {} without a matching business",
            stats.overrides_applied, stats.unmatched_overrides
        );
        Ok(())
    }

    /// Rebuild the full-text index from the current table contents.
    pub fn rebuild_search_index(&self) -> Result<()> {
        info!("🔎 Rebuilding full-text search index");
        self.conn.execute_batch(
            "INSERT INTO businesses_fts(businesses_fts) VALUES('rebuild');
             INSERT INTO businesses_fts(businesses_fts) VALUES('optimize');",
        )?;
        Ok(())
    }

    /// Replace the statistics table with freshly computed aggregates.
    pub fn recompute_statistics(&mut self) -> Result<Statistics> {
        let count = |sql: &str| -> rusqlite::Result<u64> {
            self.conn
                .query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n.max(0) as u64)
        };

        let statistics = Statistics {
            total_businesses: count("SELECT COUNT(*) FROM businesses")?,
            geocoded_businesses: count(
                "SELECT COUNT(*) FROM businesses WHERE lat IS NOT NULL AND lon IS NOT NULL",
            )?,
            unique_postal_codes: count("SELECT COUNT(DISTINCT postal_code) FROM businesses")?,
            unique_cities: count("SELECT COUNT(DISTINCT city) FROM businesses")?,
            with_street_address: count(
                "SELECT COUNT(*) FROM businesses WHERE street_address IS NOT NULL AND street_address != ''",
            )?,
            with_phone: count("SELECT COUNT(*) FROM businesses WHERE phone IS NOT NULL AND phone != ''")?,
            with_email: count("SELECT COUNT(*) FROM businesses WHERE email IS NOT NULL AND email != ''")?,
            with_website: count(
                "SELECT COUNT(*) FROM businesses WHERE website IS NOT NULL AND website != ''",
            )?,
            database_version: DATABASE_VERSION.to_string(),
            schema_version: self.schema_version,
            last_updated: Utc::now().to_rfc3339(),
        };

        let pairs = [
            (STAT_TOTAL_BUSINESSES, statistics.total_businesses.to_string()),
            (STAT_GEOCODED_BUSINESSES, statistics.geocoded_businesses.to_string()),
            (STAT_UNIQUE_POSTAL_CODES, statistics.unique_postal_codes.to_string()),
            (STAT_UNIQUE_CITIES, statistics.unique_cities.to_string()),
            (STAT_WITH_STREET_ADDRESS, statistics.with_street_address.to_string()),
            (STAT_WITH_PHONE, statistics.with_phone.to_string()),
            (STAT_WITH_EMAIL, statistics.with_email.to_string()),
            (STAT_WITH_WEBSITE, statistics.with_website.to_string()),
            (STAT_DATABASE_VERSION, statistics.database_version.clone()),
            (STAT_SCHEMA_VERSION, statistics.schema_version.to_string()),
            (STAT_LAST_UPDATED, statistics.last_updated.clone()),
        ];

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM statistics", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO statistics (key, value) VALUES (?1, ?2)")?;
            for (key, value) in &pairs {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;

        info!(
            "📊 Statistics: {} businesses, {} geocoded, {} postal codes, {} cities",
            statistics.total_businesses,
            statistics.geocoded_businesses,
            statistics.unique_postal_codes,
            statistics.unique_cities
        );
        Ok(statistics)
    }

    pub fn record_run(&self, lineage: &RunLineage, stats: &StoreStats) -> Result<()> {
        let precise = lineage.precise.as_ref();
        self.conn.execute(
            "INSERT OR REPLACE INTO pipeline_runs (
                run_id, started_at, finished_at,
                primary_sha256, primary_bytes,
                categories_sha256, categories_bytes,
                precise_sha256, precise_bytes,
                records_written, write_errors, summary_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                lineage.run_id.to_string(),
                lineage.started_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                lineage.primary.sha256,
                lineage.primary.bytes as i64,
                lineage.categories.sha256,
                lineage.categories.bytes as i64,
                precise.map(|f| f.sha256.as_str()),
                precise.map(|f| f.bytes as i64),
                stats.written as i64,
                stats.write_errors as i64,
                serde_json::to_string(stats)?,
            ],
        )?;
        debug!("Recorded lineage for run {}", lineage.run_id);
        Ok(())
    }

    /// Reclaim space, refresh planner statistics and fold the WAL back into one file.
    pub fn compact(&self) -> Result<()> {
        info!("🧹 Compacting store");
        self.conn.execute_batch(
            r#"
            VACUUM;
            ANALYZE;
            PRAGMA journal_mode=DELETE;
            "#,
        )?;
        Ok(())
    }
}

fn upsert_one(
    stmt: &mut Statement<'_>,
    record: &BusinessRecord,
    categories: &str,
    branch_ids: &str,
) -> rusqlite::Result<()> {
    stmt.execute(params![
        record.id,
        record.name,
        record.postal_code,
        record.city,
        record.lat(),
        record.lon(),
        categories,
        branch_ids,
        record.street_address,
        record.district,
        record.phone,
        record.email,
        record.website,
    ])?;
    Ok(())
}

fn apply_one(stmt: &mut Statement<'_>, id: &str, entry: &PrecisionOverride) -> rusqlite::Result<usize> {
    stmt.execute(params![
        id,
        entry.coordinate.map(|c| c.lat),
        entry.coordinate.map(|c| c.lon),
        entry.street_address,
        entry.district,
        entry.phone,
        entry.email,
        entry.website,
    ])
}

fn remove_store_files(path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(suffix);
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            fs::remove_file(&candidate)?;
            info!("Removed existing store file {}", candidate.display());
        }
    }
    Ok(())
}
