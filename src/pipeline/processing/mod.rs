// Pipeline processing: source parsing, category join, coordinate enrichment

pub mod categories;
pub mod extract;
pub mod geocode;
pub mod parser;
pub mod precise;

pub use categories::{CategoryIndex, CategoryIndexBuilder, CategoryIndexStats};
pub use extract::{ExtractStats, RecordExtractor};
pub use geocode::{CoordinateEnricher, GeocodeStats};
pub use precise::{PreciseStats, PrecisionEnricher};
