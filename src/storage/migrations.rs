//! Versioned, additive schema migrations for the business store.
//!
//! Applied versions are recorded in `schema_migrations`; each pending
//! migration runs in its own transaction.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    apply: fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

/// Result of a single additive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied,
    /// The target already existed, e.g. a column added by an older loader
    AlreadyCurrent,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_businesses",
        apply: create_businesses,
    },
    Migration {
        version: 2,
        name: "add_contact_columns",
        apply: add_contact_columns,
    },
    Migration {
        version: 3,
        name: "create_search_index",
        apply: create_search_index,
    },
    Migration {
        version: 4,
        name: "create_statistics",
        apply: create_statistics,
    },
    Migration {
        version: 5,
        name: "create_pipeline_runs",
        apply: create_pipeline_runs,
    },
];

/// Highest version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

pub fn current_version(conn: &Connection) -> rusqlite::Result<u32> {
    ensure_registry(conn)?;
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the recorded version. Returns how many ran.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<usize> {
    let current = current_version(conn)?;
    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        (migration.apply)(&tx)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        info!("🧱 Applied migration {} ({})", migration.version, migration.name);
        applied += 1;
    }
    if applied == 0 {
        debug!("Schema already at version {}", current);
    }
    Ok(applied)
}

fn ensure_registry(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )
}

fn column_exists(tx: &Transaction<'_>, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = tx.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// `ALTER TABLE .. ADD COLUMN` unless the column is already there.
pub fn add_column_if_missing(
    tx: &Transaction<'_>,
    table: &str,
    column: &str,
    decl: &str,
) -> rusqlite::Result<MigrationOutcome> {
    if column_exists(tx, table, column)? {
        debug!("{}.{} already exists", table, column);
        return Ok(MigrationOutcome::AlreadyCurrent);
    }
    tx.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {};", table, column, decl))?;
    Ok(MigrationOutcome::Applied)
}

fn create_businesses(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS businesses (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            postal_code TEXT,
            city        TEXT,
            lat         REAL,
            lon         REAL,
            categories  TEXT,
            branch_ids  TEXT,
            created_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_postal_code ON businesses(postal_code);
        CREATE INDEX IF NOT EXISTS idx_city ON businesses(city);
        CREATE INDEX IF NOT EXISTS idx_lat_lon ON businesses(lat, lon);
        CREATE INDEX IF NOT EXISTS idx_name ON businesses(name);",
    )
}

fn add_contact_columns(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    for column in ["street_address", "district", "phone", "email", "website"] {
        add_column_if_missing(tx, "businesses", column, "TEXT")?;
    }
    Ok(())
}

fn create_search_index(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS businesses_fts USING fts5(
            id UNINDEXED,
            name,
            categories,
            content='businesses',
            content_rowid='rowid'
        );",
    )
}

fn create_statistics(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS statistics (
            key        TEXT PRIMARY KEY,
            value      TEXT,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );",
    )
}

fn create_pipeline_runs(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS pipeline_runs (
            run_id            TEXT PRIMARY KEY,
            started_at        TEXT NOT NULL,
            finished_at       TEXT NOT NULL,
            primary_sha256    TEXT,
            primary_bytes     INTEGER,
            categories_sha256 TEXT,
            categories_bytes  INTEGER,
            precise_sha256    TEXT,
            precise_bytes     INTEGER,
            records_written   INTEGER NOT NULL,
            write_errors      INTEGER NOT NULL,
            summary_json      TEXT
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&mut conn).unwrap(), MIGRATIONS.len());
        assert_eq!(current_version(&conn).unwrap(), latest_version());
        assert_eq!(run_migrations(&mut conn).unwrap(), 0);

        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(recorded as usize, MIGRATIONS.len());
    }

    #[test]
    fn legacy_store_with_contact_columns_migrates_cleanly() {
        let mut conn = Connection::open_in_memory().unwrap();
        // Store written by the old loader: base table plus one contact column, no registry
        conn.execute_batch(
            "CREATE TABLE businesses (
                id TEXT PRIMARY KEY, name TEXT NOT NULL, postal_code TEXT, city TEXT,
                lat REAL, lon REAL, categories TEXT, branch_ids TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            ALTER TABLE businesses ADD COLUMN phone TEXT;",
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();

        let tx = conn.transaction().unwrap();
        for column in ["street_address", "district", "phone", "email", "website"] {
            assert!(column_exists(&tx, "businesses", column).unwrap());
        }
        assert_eq!(
            add_column_if_missing(&tx, "businesses", "phone", "TEXT").unwrap(),
            MigrationOutcome::AlreadyCurrent
        );
    }
}
