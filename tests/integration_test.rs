use anyhow::Result;
use business_loader::config::PipelineConfig;
use business_loader::reference::postal_centroids::centroid_for;
use business_loader::storage::{BusinessQuery, StoreReader};
use business_loader::types::{BusinessRecord, Coordinate};
use business_loader::{Pipeline, PipelineError, RunContext};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn primary_line(id: &str, postal: &str, city: &str, name: &str) -> String {
    json!({
        "_id": id,
        "verlagsdaten": {
            "kontaktinformationen": {
                "adresse": { "postleitzahl": postal, "ortsname": city },
                "personListe": [{ "name": name }]
            },
            "branchenIdListe": ["1200"]
        }
    })
    .to_string()
}

fn precise_line(participant: Value) -> String {
    json!({ "antwort": { "daten": { "teilnehmer": participant } } }).to_string()
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Result<Self> {
        let fixture = Self { dir: tempdir()? };

        let primary = [
            primary_line("a", "10115", "Berlin", "Salon Mitte"),
            "{\"_id\": \"broken\", ".to_string(),
            primary_line("b", "10117", "Berlin", "Bäckerei Kraus"),
            primary_line("c", "80331", "München", "Weißwurst Stube"),
            primary_line("d", "12043", "Berlin", "Späti Neukölln"),
        ];
        fs::write(fixture.path("primary.jsonl"), primary.join("\n"))?;

        let categories = json!([
            { "business_name": "Salon Mitte", "categories": [{ "text": "Friseur" }, { "text": "Kosmetik" }] },
            { "business_name": "Bäckerei Kraus", "categories": [{ "text": "Bäckerei" }] }
        ]);
        fs::write(fixture.path("categories.json"), categories.to_string())?;

        fixture.write_precise(Some("salon@example.de"))?;
        Ok(fixture)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_precise(&self, email: Option<&str>) -> Result<()> {
        let mut contact = json!({ "telefon": [{ "rufnummer": "030 2345678" }] });
        if let Some(email) = email {
            contact["email"] = json!([{ "email": email }]);
        }
        let lines = [
            precise_line(json!({
                "id": "a",
                "adresse": {
                    "strasse": "Invalidenstraße",
                    "hausnr": "12",
                    "stadtteil": "Mitte",
                    "geodaten": { "koordinaten": [
                        { "format": "UTM", "x": 390000.0, "y": 5820000.0 },
                        { "format": "WGS84", "x": 13.3811, "y": 52.5321 }
                    ]}
                },
                "kontakt": contact
            })),
            precise_line(json!({ "id": "not-in-store", "adresse": { "stadtteil": "Wedding" } })),
        ];
        fs::write(self.path("precise.jsonl"), lines.join("\n"))?;
        Ok(())
    }

    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.sources.primary = self.path("primary.jsonl");
        config.sources.categories = self.path("categories.json");
        config.sources.precise = Some(self.path("precise.jsonl"));
        config.store.path = self.path("data").join("businesses.db");
        config.store.batch_size = 2;
        config.logging.dir = self.path("logs");
        config
    }

    fn store(&self) -> PathBuf {
        self.path("data").join("businesses.db")
    }
}

fn run(config: PipelineConfig) -> business_loader::Result<business_loader::PipelineResult> {
    Pipeline::run(&RunContext::new(config)?)
}

fn all_records(store: &Path) -> Result<Vec<BusinessRecord>> {
    let reader = StoreReader::open(store)?;
    Ok(reader.search(&BusinessQuery {
        limit: 1000,
        ..Default::default()
    })?)
}

#[test]
fn full_build_applies_every_stage() -> Result<()> {
    let fixture = Fixture::new()?;
    let result = run(fixture.config())?;

    assert_eq!(result.extract.lines_seen, 5);
    assert_eq!(result.extract.malformed, 1);
    assert_eq!(result.extract.out_of_area, 1);
    assert_eq!(result.extract.emitted, 3);
    assert_eq!(result.geocode.geocoded, 3);
    let precise = result.precise.as_ref().expect("precise stage ran");
    assert_eq!(precise.overrides, 2);
    assert_eq!(result.store.written, 3);
    assert_eq!(result.store.overrides_applied, 1);
    assert_eq!(result.store.unmatched_overrides, 1);
    assert_eq!(result.statistics.total_businesses, 3);

    let reader = StoreReader::open(&fixture.store())?;
    let salon = reader.get("a")?.expect("salon stored");
    assert_eq!(salon.categories, ["Friseur", "Kosmetik"]);
    assert_eq!(salon.coordinate, Some(Coordinate::new(52.5321, 13.3811)));
    assert_eq!(salon.street_address.as_deref(), Some("Invalidenstraße 12"));
    assert_eq!(salon.district.as_deref(), Some("Mitte"));
    assert_eq!(salon.phone.as_deref(), Some("030 2345678"));

    let bakery = reader.get("b")?.expect("bakery stored");
    assert_eq!(bakery.coordinate, centroid_for("10117"));
    assert_eq!(bakery.branch_ids, ["1200"]);
    assert!(bakery.phone.is_none());

    let spaeti = reader.get("d")?.expect("späti stored");
    assert!(spaeti.categories.is_empty());
    assert!(reader.get("c")?.is_none());

    let hits = reader.full_text("Kosmetik", 10)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");

    let stats = reader.statistics()?;
    assert_eq!(stats.total_businesses, 3);
    assert_eq!(stats.geocoded_businesses, 3);
    assert_eq!(stats.with_phone, 1);
    Ok(())
}

#[test]
fn extracted_records_satisfy_record_invariants() -> Result<()> {
    let fixture = Fixture::new()?;
    run(fixture.config())?;

    for record in all_records(&fixture.store())? {
        assert!(!record.id.is_empty());
        assert!(!record.name.is_empty());
        let code: u32 = record.postal_code.parse()?;
        assert!((10115..=14199).contains(&code));
        assert_eq!(record.lat().is_some(), record.lon().is_some());
    }
    Ok(())
}

#[test]
fn rerunning_on_identical_inputs_is_idempotent() -> Result<()> {
    let fixture = Fixture::new()?;
    let first = run(fixture.config())?;
    let before = all_records(&fixture.store())?;
    let second = run(fixture.config())?;
    let after = all_records(&fixture.store())?;

    assert_eq!(before, after);
    let (a, b) = (&first.statistics, &second.statistics);
    assert_eq!(a.total_businesses, b.total_businesses);
    assert_eq!(a.geocoded_businesses, b.geocoded_businesses);
    assert_eq!(a.unique_postal_codes, b.unique_postal_codes);
    assert_eq!(a.unique_cities, b.unique_cities);
    assert_eq!(a.with_email, b.with_email);

    let conn = rusqlite::Connection::open(fixture.store())?;
    let runs: i64 = conn.query_row("SELECT COUNT(*) FROM pipeline_runs", [], |r| r.get(0))?;
    assert_eq!(runs, 2);
    let sha: String = conn.query_row(
        "SELECT primary_sha256 FROM pipeline_runs LIMIT 1",
        [],
        |r| r.get(0),
    )?;
    assert_eq!(sha, first.extract.fingerprint.sha256);
    Ok(())
}

#[test]
fn override_without_email_keeps_the_stored_email() -> Result<()> {
    let fixture = Fixture::new()?;
    run(fixture.config())?;
    let reader = StoreReader::open(&fixture.store())?;
    assert_eq!(reader.get("a")?.and_then(|r| r.email).as_deref(), Some("salon@example.de"));
    drop(reader);

    fixture.write_precise(None)?;
    run(fixture.config())?;

    let salon = StoreReader::open(&fixture.store())?.get("a")?.expect("salon stored");
    assert_eq!(salon.email.as_deref(), Some("salon@example.de"));
    assert_eq!(salon.coordinate, Some(Coordinate::new(52.5321, 13.3811)));
    Ok(())
}

#[test]
fn without_precise_source_the_centroid_stands() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut config = fixture.config();
    config.sources.precise = None;
    let result = run(config)?;

    assert!(result.precise.is_none());
    let salon = StoreReader::open(&fixture.store())?.get("a")?.expect("salon stored");
    assert_eq!(salon.coordinate, Some(Coordinate::new(52.5308, 13.3847)));
    assert!(salon.phone.is_none());
    Ok(())
}

#[test]
fn missing_sources_abort_the_run() -> Result<()> {
    let fixture = Fixture::new()?;

    let mut config = fixture.config();
    config.sources.primary = fixture.path("absent.jsonl");
    assert!(matches!(run(config), Err(PipelineError::SourceNotFound { .. })));

    let mut config = fixture.config();
    config.sources.precise = Some(fixture.path("absent-precise.jsonl"));
    assert!(matches!(run(config), Err(PipelineError::SourceNotFound { .. })));

    fs::write(fixture.path("categories.json"), "{ not an array")?;
    assert!(matches!(
        run(fixture.config()),
        Err(PipelineError::SourceUnparseable { .. })
    ));
    assert!(!fixture.store().exists());
    Ok(())
}
