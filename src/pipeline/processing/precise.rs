use crate::config::RunContext;
use crate::error::{RecordError, Result};
use crate::pipeline::ingestion::{is_blank, NdjsonReader, SourceFingerprint};
use crate::pipeline::processing::parser::from_object_line;
use crate::pipeline::processing::parser::precise::PreciseLine;
use crate::types::{PrecisionOverride, PrecisionOverrideMap};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

#[derive(Debug, Default, Clone, Serialize)]
pub struct PreciseStats {
    pub lines_seen: u64,
    pub overrides: u64,
    pub malformed: u64,
    pub missing_id: u64,
    pub blank_lines: u64,
    /// Lines whose id had already been seen (last one wins)
    pub duplicate_ids: u64,
    pub with_coordinates: u64,
    pub with_street: u64,
    pub with_district: u64,
    pub with_phone: u64,
    pub with_email: u64,
    pub with_website: u64,
    pub fingerprint: SourceFingerprint,
}

/// Precise enrichment: per-business coordinates and contact details keyed by id.
pub struct PrecisionEnricher {
    progress_every: u64,
}

impl PrecisionEnricher {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            progress_every: ctx.config.enrich.progress_every,
        }
    }

    /// Stream the precise source into an override map. A missing file is fatal.
    #[instrument(skip(self, ctx), fields(run_id = %ctx.run_id))]
    pub fn load(&self, ctx: &RunContext, path: &Path) -> Result<(PrecisionOverrideMap, PreciseStats)> {
        info!("📍 Loading precise business data from {}", path.display());
        let reader = NdjsonReader::open(path)?;
        self.load_from(reader)
    }

    pub fn load_from<R: Read>(
        &self,
        mut reader: NdjsonReader<R>,
    ) -> Result<(PrecisionOverrideMap, PreciseStats)> {
        let mut overrides = PrecisionOverrideMap::new();
        let mut stats = PreciseStats::default();

        while let Some((line_no, line)) = reader.next_line()? {
            stats.lines_seen += 1;
            if stats.lines_seen % self.progress_every == 0 {
                info!("Processed {} precise records...", stats.lines_seen);
            }
            if is_blank(line) {
                stats.blank_lines += 1;
                continue;
            }

            match Self::parse_line(line_no, line) {
                Ok((id, entry)) => {
                    if overrides.insert(id, entry).is_some() {
                        stats.duplicate_ids += 1;
                    }
                }
                Err(err) => {
                    debug!("{}", err);
                    match err {
                        RecordError::Malformed { .. } => stats.malformed += 1,
                        _ => stats.missing_id += 1,
                    }
                }
            }
        }

        // Coverage counts the surviving entry per id, not every line
        for entry in overrides.values() {
            stats.with_coordinates += entry.coordinate.is_some() as u64;
            stats.with_street += entry.street_address.is_some() as u64;
            stats.with_district += entry.district.is_some() as u64;
            stats.with_phone += entry.phone.is_some() as u64;
            stats.with_email += entry.email.is_some() as u64;
            stats.with_website += entry.website.is_some() as u64;
        }
        stats.overrides = overrides.len() as u64;
        stats.fingerprint = reader.finish();

        info!(
            "✅ Precise data loaded: {} lines, {} businesses ({} with coordinates, {} with street, {} with phone, {} with email, {} with website), {} malformed",
            stats.lines_seen,
            stats.overrides,
            stats.with_coordinates,
            stats.with_street,
            stats.with_phone,
            stats.with_email,
            stats.with_website,
            stats.malformed
        );
        Ok((overrides, stats))
    }

    fn parse_line(
        line_no: u64,
        line: &[u8],
    ) -> std::result::Result<(String, PrecisionOverride), RecordError> {
        let parsed: PreciseLine = from_object_line(line).map_err(|reason| RecordError::Malformed {
            line: line_no,
            reason,
        })?;

        let missing_id = || RecordError::MissingRequiredField {
            line: line_no,
            field: "teilnehmer.id",
        };
        let participant = parsed.participant().ok_or_else(missing_id)?;
        let id = participant.id.clone().ok_or_else(missing_id)?;

        let mut entry = PrecisionOverride::default();
        if let Some(address) = &participant.address {
            entry.coordinate = address.wgs84_coordinate();
            entry.street_address = address.street_address();
            entry.district = address.district.clone();
        }
        if let Some(contact) = &participant.contact {
            entry.phone = contact.first_phone().map(str::to_string);
            entry.email = contact.first_email().map(str::to_string);
            entry.website = contact.first_website().map(str::to_string);
        }
        Ok((id, entry))
    }
}
