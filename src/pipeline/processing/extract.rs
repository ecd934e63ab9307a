use crate::config::RunContext;
use crate::error::{RecordError, Result};
use crate::pipeline::ingestion::{is_blank, NdjsonReader, SourceFingerprint};
use crate::pipeline::processing::categories::CategoryIndex;
use crate::pipeline::processing::parser::directory::DirectoryLine;
use crate::pipeline::processing::parser::from_object_line;
use crate::types::BusinessRecord;
use serde::Serialize;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Exact end-of-run counters for the extraction stage.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExtractStats {
    pub lines_seen: u64,
    pub emitted: u64,
    pub malformed: u64,
    pub missing_name: u64,
    pub missing_id: u64,
    /// Filtered by the postal code predicate (not an error)
    pub out_of_area: u64,
    pub blank_lines: u64,
    pub fingerprint: SourceFingerprint,
}

/// What became of one input line.
#[derive(Debug)]
enum LineOutcome {
    Emitted(BusinessRecord),
    OutOfArea,
}

/// True when `postal_code` is all ASCII digits and its value lies in `range`.
pub fn in_postal_range(postal_code: &str, range: &RangeInclusive<u32>) -> bool {
    let code = postal_code.trim();
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    code.parse::<u32>()
        .map(|value| range.contains(&value))
        .unwrap_or(false)
}

pub struct RecordExtractor<'a> {
    categories: &'a CategoryIndex,
    postal_range: RangeInclusive<u32>,
    progress_every: u64,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(ctx: &RunContext, categories: &'a CategoryIndex) -> Self {
        Self {
            categories,
            postal_range: ctx.postal_range(),
            progress_every: ctx.config.extract.progress_every,
        }
    }

    /// Stream the primary source and keep the businesses inside the target area.
    #[instrument(skip(self, ctx), fields(run_id = %ctx.run_id))]
    pub fn extract(&self, ctx: &RunContext, path: &Path) -> Result<(Vec<BusinessRecord>, ExtractStats)> {
        info!("📥 Extracting businesses from {}", path.display());
        let reader = NdjsonReader::open(path)?;
        self.extract_from(reader)
    }

    pub fn extract_from<R: Read>(
        &self,
        mut reader: NdjsonReader<R>,
    ) -> Result<(Vec<BusinessRecord>, ExtractStats)> {
        let mut records = Vec::new();
        let mut stats = ExtractStats::default();

        while let Some((line_no, line)) = reader.next_line()? {
            stats.lines_seen += 1;
            if stats.lines_seen % self.progress_every == 0 {
                info!(
                    "Progress: {} lines processed, {} businesses in area",
                    stats.lines_seen, stats.emitted
                );
            }
            if is_blank(line) {
                stats.blank_lines += 1;
                continue;
            }

            match self.process_line(line_no, line) {
                Ok(LineOutcome::Emitted(record)) => {
                    stats.emitted += 1;
                    records.push(record);
                }
                Ok(LineOutcome::OutOfArea) => stats.out_of_area += 1,
                Err(err) => {
                    debug!("{}", err);
                    match err {
                        RecordError::Malformed { .. } => stats.malformed += 1,
                        RecordError::MissingRequiredField { field: "name", .. } => {
                            stats.missing_name += 1
                        }
                        RecordError::MissingRequiredField { .. } => stats.missing_id += 1,
                        RecordError::StorageWrite { .. } => {}
                    }
                }
            }
        }

        stats.fingerprint = reader.finish();
        info!(
            "✅ Extraction complete: {} lines, {} businesses, {} malformed, {} missing name, {} missing id, {} outside area",
            stats.lines_seen,
            stats.emitted,
            stats.malformed,
            stats.missing_name,
            stats.missing_id,
            stats.out_of_area
        );
        Ok((records, stats))
    }

    fn process_line(&self, line_no: u64, line: &[u8]) -> std::result::Result<LineOutcome, RecordError> {
        let parsed: DirectoryLine = from_object_line(line).map_err(|reason| RecordError::Malformed {
            line: line_no,
            reason,
        })?;

        let postal_code = match parsed.postal_code() {
            Some(code) if in_postal_range(code, &self.postal_range) => code,
            _ => return Ok(LineOutcome::OutOfArea),
        };

        let name = parsed
            .business_name()
            .ok_or(RecordError::MissingRequiredField {
                line: line_no,
                field: "name",
            })?;
        let id = parsed.id.as_deref().ok_or(RecordError::MissingRequiredField {
            line: line_no,
            field: "_id",
        })?;

        let mut record = BusinessRecord::new(
            id.to_string(),
            name.to_string(),
            postal_code.to_string(),
            parsed.city().unwrap_or_default().to_string(),
        );
        record.categories = self.categories.lookup(name).to_vec();
        record.branch_ids = parsed.branch_ids().to_vec();
        Ok(LineOutcome::Emitted(record))
    }
}
