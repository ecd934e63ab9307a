// Pipeline ingestion: line-at-a-time reading and fingerprinting of source exports

pub mod ndjson;

pub use ndjson::{is_blank, NdjsonReader, SourceFingerprint};
