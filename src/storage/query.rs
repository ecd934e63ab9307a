//! Read-only access to a finished store, covering the lookups the directory
//! API serves: filtered listing, lookup by id, full-text search, statistics
//! and the distinct category and city lists.

use crate::constants::*;
use crate::error::{PipelineError, Result};
use crate::types::{BusinessRecord, Coordinate, Statistics};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

const SELECT_COLUMNS: &str = "id, name, postal_code, city, district, street_address, categories, \
     branch_ids, lat, lon, phone, email, website";

pub const DEFAULT_QUERY_LIMIT: u32 = 100;

/// Filters for [`StoreReader::search`]. Unset filters match everything.
#[derive(Debug, Clone)]
pub struct BusinessQuery {
    /// Case-insensitive substring of the business name
    pub name: Option<String>,
    /// Substring of the serialized category list
    pub category: Option<String>,
    /// Exact city
    pub city: Option<String>,
    pub geocoded_only: bool,
    pub limit: u32,
    pub offset: u32,
}

impl Default for BusinessQuery {
    fn default() -> Self {
        Self {
            name: None,
            category: None,
            city: None,
            geocoded_only: false,
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl BusinessQuery {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("name LIKE ? ESCAPE '\\'");
            values.push(Value::Text(like_pattern(name)));
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("categories LIKE ? ESCAPE '\\'");
            values.push(Value::Text(like_pattern(category)));
        }
        if let Some(city) = self.city.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("city = ?");
            values.push(Value::Text(city.to_string()));
        }
        if self.geocoded_only {
            clauses.push("lat IS NOT NULL AND lon IS NOT NULL");
        }

        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (sql, values)
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Quote each whitespace-separated term so user input is never parsed as FTS syntax.
fn fts_match_expr(term: &str) -> String {
    term.split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct StoreReader {
    conn: Connection,
}

impl StoreReader {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened store {} read-only", path.display());
        Ok(Self { conn })
    }

    pub fn search(&self, query: &BusinessQuery) -> Result<Vec<BusinessRecord>> {
        let (filter, mut values) = query.where_clause();
        let sql = format!(
            "SELECT {} FROM businesses{} ORDER BY name, id LIMIT ? OFFSET ?",
            SELECT_COLUMNS, filter
        );
        values.push(Value::Integer(query.limit as i64));
        values.push(Value::Integer(query.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of businesses matching the filters, ignoring limit and offset.
    pub fn count(&self, query: &BusinessQuery) -> Result<u64> {
        let (filter, values) = query.where_clause();
        let sql = format!("SELECT COUNT(*) FROM businesses{}", filter);
        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn get(&self, id: &str) -> Result<Option<BusinessRecord>> {
        let sql = format!("SELECT {} FROM businesses WHERE id = ?1", SELECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], record_from_row)
            .optional()?)
    }

    /// Ranked full-text match over name and categories, as of the last index rebuild.
    pub fn full_text(&self, term: &str, limit: u32) -> Result<Vec<BusinessRecord>> {
        let expr = fts_match_expr(term);
        if expr.is_empty() {
            return Ok(Vec::new());
        }
        let columns = SELECT_COLUMNS
            .split(", ")
            .map(|c| format!("b.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM businesses_fts f
             JOIN businesses b ON b.rowid = f.rowid
             WHERE businesses_fts MATCH ?1
             ORDER BY f.rank
             LIMIT ?2",
            columns
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![expr, limit as i64], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM statistics")?;
        let pairs: HashMap<String, String> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, Option<String>>(1)?.unwrap_or_default())))?
            .collect::<rusqlite::Result<_>>()?;

        let number = |key: &str| pairs.get(key).and_then(|v| v.parse().ok()).unwrap_or(0);
        let text = |key: &str| pairs.get(key).cloned().unwrap_or_default();

        Ok(Statistics {
            total_businesses: number(STAT_TOTAL_BUSINESSES),
            geocoded_businesses: number(STAT_GEOCODED_BUSINESSES),
            unique_postal_codes: number(STAT_UNIQUE_POSTAL_CODES),
            unique_cities: number(STAT_UNIQUE_CITIES),
            with_street_address: number(STAT_WITH_STREET_ADDRESS),
            with_phone: number(STAT_WITH_PHONE),
            with_email: number(STAT_WITH_EMAIL),
            with_website: number(STAT_WITH_WEBSITE),
            database_version: text(STAT_DATABASE_VERSION),
            schema_version: number(STAT_SCHEMA_VERSION) as u32,
            last_updated: text(STAT_LAST_UPDATED),
        })
    }

    /// Distinct category labels across all businesses, sorted.
    pub fn categories(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT categories FROM businesses WHERE categories IS NOT NULL AND categories != '[]'",
        )?;
        let mut labels = BTreeSet::new();
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for raw in rows {
            let parsed: Vec<String> = serde_json::from_str(&raw?)?;
            labels.extend(parsed);
        }
        Ok(labels.into_iter().collect())
    }

    pub fn cities(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT city FROM businesses WHERE city IS NOT NULL AND city != '' ORDER BY city",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BusinessRecord> {
    let lat: Option<f64> = row.get(8)?;
    let lon: Option<f64> = row.get(9)?;
    Ok(BusinessRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        postal_code: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        city: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        district: row.get(4)?,
        street_address: row.get(5)?,
        categories: json_list(row, 6)?,
        branch_ids: json_list(row, 7)?,
        coordinate: lat.zip(lon).map(|(lat, lon)| Coordinate::new(lat, lon)),
        phone: row.get(10)?,
        email: row.get(11)?,
        website: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::builder::{StoreBuilder, StoreStats};

    fn seeded_store(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("store.db");
        let mut builder = StoreBuilder::open_at(&path, 10, false).unwrap();
        let mut stats = StoreStats::default();

        let mut salon = BusinessRecord::new("a".into(), "Salon 100%".into(), "10115".into(), "Berlin".into());
        salon.categories = vec!["Friseur".into(), "Kosmetik".into()];
        salon.coordinate = Some(Coordinate::new(52.5308, 13.3847));
        let mut bakery = BusinessRecord::new("b".into(), "Bäckerei Kraus".into(), "14467".into(), "Potsdam".into());
        bakery.categories = vec!["Bäckerei".into()];
        let cafe = BusinessRecord::new("c".into(), "Café Salonfähig".into(), "10961".into(), "Berlin".into());

        builder.upsert_records(&[salon, bakery, cafe], &mut stats).unwrap();
        builder.rebuild_search_index().unwrap();
        builder.recompute_statistics().unwrap();
        builder.compact().unwrap();
        path
    }

    #[test]
    fn search_filters_and_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StoreReader::open(&seeded_store(&dir)).unwrap();

        let by_name = BusinessQuery {
            name: Some("salon".into()),
            ..Default::default()
        };
        let ids: Vec<_> = reader.search(&by_name).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["c", "a"]);
        assert_eq!(reader.count(&by_name).unwrap(), 2);

        let page = BusinessQuery {
            city: Some("Berlin".into()),
            limit: 1,
            offset: 1,
            ..Default::default()
        };
        assert_eq!(reader.search(&page).unwrap()[0].id, "a");

        let geocoded = BusinessQuery {
            geocoded_only: true,
            ..Default::default()
        };
        let found = reader.search(&geocoded).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].categories, ["Friseur", "Kosmetik"]);
        assert_eq!(found[0].coordinate, Some(Coordinate::new(52.5308, 13.3847)));
    }

    #[test]
    fn like_wildcards_in_input_are_literal() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StoreReader::open(&seeded_store(&dir)).unwrap();
        let query = BusinessQuery {
            name: Some("100%".into()),
            ..Default::default()
        };
        assert_eq!(reader.count(&query).unwrap(), 1);
        let query = BusinessQuery {
            category: Some("Bäck".into()),
            ..Default::default()
        };
        assert_eq!(reader.search(&query).unwrap()[0].id, "b");
    }

    #[test]
    fn lookups_lists_and_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StoreReader::open(&seeded_store(&dir)).unwrap();

        assert_eq!(reader.get("b").unwrap().unwrap().city, "Potsdam");
        assert!(reader.get("zzz").unwrap().is_none());
        assert_eq!(reader.categories().unwrap(), ["Bäckerei", "Friseur", "Kosmetik"]);
        assert_eq!(reader.cities().unwrap(), ["Berlin", "Potsdam"]);

        let stats = reader.statistics().unwrap();
        assert_eq!(stats.total_businesses, 3);
        assert_eq!(stats.geocoded_businesses, 1);
        assert_eq!(stats.unique_cities, 2);
        assert_eq!(stats.database_version, DATABASE_VERSION);
    }

    #[test]
    fn full_text_matches_name_and_categories() {
        let dir = tempfile::tempdir().unwrap();
        let reader = StoreReader::open(&seeded_store(&dir)).unwrap();

        let hits = reader.full_text("Kosmetik", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert_eq!(reader.full_text("Kraus", 10).unwrap()[0].id, "b");
        assert!(reader.full_text("   ", 10).unwrap().is_empty());
    }

    #[test]
    fn missing_store_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreReader::open(&dir.path().join("absent.db")).err().unwrap();
        assert!(matches!(err, PipelineError::SourceNotFound { .. }));
    }
}
