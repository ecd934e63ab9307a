use crate::config::{CollisionPolicy, RunContext};
use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::SourceFingerprint;
use crate::pipeline::processing::parser::categories::CategoryEntry;
use crate::pipeline::processing::parser::from_object_line;
use serde::Serialize;
use serde_json::value::RawValue;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Business display name -> ordered category labels.
#[derive(Debug, Default, Clone)]
pub struct CategoryIndex {
    by_name: HashMap<String, Vec<String>>,
}

impl CategoryIndex {
    /// Exact-name lookup; unknown names have no categories.
    pub fn lookup(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Insert under the given policy. Returns true when `name` was already present.
    fn insert(&mut self, name: String, labels: Vec<String>, policy: CollisionPolicy) -> bool {
        match self.by_name.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(labels);
                false
            }
            Entry::Occupied(mut slot) => {
                if policy == CollisionPolicy::LastWins {
                    slot.insert(labels);
                }
                true
            }
        }
    }
}

impl FromIterator<(String, Vec<String>)> for CategoryIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            by_name: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct CategoryIndexStats {
    pub entries: u64,
    pub names: u64,
    /// Entries with an empty name or no usable labels
    pub skipped_entries: u64,
    /// Array elements that do not have the entry shape at all
    pub invalid_entries: u64,
    pub collisions: u64,
    pub fingerprint: SourceFingerprint,
}

pub struct CategoryIndexBuilder;

impl CategoryIndexBuilder {
    /// Load the secondary source. Missing or structurally broken files are fatal.
    #[instrument(skip(ctx), fields(run_id = %ctx.run_id))]
    pub fn build(ctx: &RunContext, path: &Path) -> Result<(CategoryIndex, CategoryIndexStats)> {
        info!("📚 Loading category mappings from {}", path.display());
        let bytes = fs::read(path).map_err(|e| PipelineError::from_open(path, e))?;
        let fingerprint = SourceFingerprint::of_bytes(path, &bytes);

        let (index, mut stats) =
            Self::build_from_slice(&bytes, ctx.config.categories.collision_policy).map_err(
                |e| PipelineError::SourceUnparseable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            )?;
        stats.fingerprint = fingerprint;

        info!(
            "✅ Category index ready: {} names from {} entries ({} skipped, {} invalid, {} collisions, policy {:?})",
            stats.names,
            stats.entries,
            stats.skipped_entries,
            stats.invalid_entries,
            stats.collisions,
            ctx.config.categories.collision_policy
        );
        Ok((index, stats))
    }

    /// Parse an in-memory copy of the source. Only a broken top level is an error.
    pub fn build_from_slice(
        bytes: &[u8],
        policy: CollisionPolicy,
    ) -> std::result::Result<(CategoryIndex, CategoryIndexStats), serde_json::Error> {
        // Elements stay unparsed until each is checked on its own
        let raw: Vec<Box<RawValue>> = serde_json::from_slice(bytes)?;

        let mut index = CategoryIndex::default();
        let mut stats = CategoryIndexStats::default();

        for (position, element) in raw.iter().enumerate() {
            stats.entries += 1;
            let entry: CategoryEntry = match from_object_line(element.get().as_bytes()) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Category entry {} does not conform: {}", position, e);
                    stats.invalid_entries += 1;
                    continue;
                }
            };

            let labels = entry.labels();
            let name = match entry.business_name {
                Some(name) if !labels.is_empty() => name,
                _ => {
                    stats.skipped_entries += 1;
                    continue;
                }
            };

            if index.insert(name.clone(), labels, policy) {
                debug!("Duplicate category entry for '{}' ({:?})", name, policy);
                stats.collisions += 1;
            }
        }

        stats.names = index.len() as u64;
        Ok((index, stats))
    }
}
