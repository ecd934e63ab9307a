/// Defaults shared by configuration, stages and the CLI.
/// The input file names follow the Gelbe Seiten export layout.

// Input locations
pub const DEFAULT_PRIMARY_SOURCE: &str = "input/gsbestand-559.json";
pub const DEFAULT_CATEGORY_SOURCE: &str = "input/gs_final.json";
pub const DEFAULT_PRECISE_SOURCE: &str = "input/berlin_business_data.jsonl";

// Outputs
pub const DEFAULT_STORE_PATH: &str = "data/berlin_businesses.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.toml";
pub const CONFIG_ENV_VAR: &str = "BUSINESS_LOADER_CONFIG";

// Berlin postal codes: 10115 (Mitte) through 14199 (Zehlendorf)
pub const DEFAULT_POSTAL_MIN: u32 = 10115;
pub const DEFAULT_POSTAL_MAX: u32 = 14199;

// Cadences
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_EXTRACT_PROGRESS_EVERY: u64 = 100_000;
pub const DEFAULT_ENRICH_PROGRESS_EVERY: u64 = 10_000;

/// Coordinate format tag that marks longitude/latitude pairs in the precise source
pub const WGS84_FORMAT: &str = "WGS84";

/// Version string written to the statistics table
pub const DATABASE_VERSION: &str = "2.0";

// Statistics keys
pub const STAT_TOTAL_BUSINESSES: &str = "total_businesses";
pub const STAT_GEOCODED_BUSINESSES: &str = "geocoded_businesses";
pub const STAT_UNIQUE_POSTAL_CODES: &str = "unique_postal_codes";
pub const STAT_UNIQUE_CITIES: &str = "unique_cities";
pub const STAT_WITH_STREET_ADDRESS: &str = "with_street_address";
pub const STAT_WITH_PHONE: &str = "with_phone";
pub const STAT_WITH_EMAIL: &str = "with_email";
pub const STAT_WITH_WEBSITE: &str = "with_website";
pub const STAT_DATABASE_VERSION: &str = "database_version";
pub const STAT_SCHEMA_VERSION: &str = "schema_version";
pub const STAT_LAST_UPDATED: &str = "last_updated";
