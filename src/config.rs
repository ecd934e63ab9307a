use crate::constants::*;
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// How the category index resolves two entries with the same display name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    FirstWins,
    #[default]
    LastWins,
}

/// Full pipeline configuration, loaded from `pipeline.toml` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourcesConfig,
    pub extract: ExtractConfig,
    pub categories: CategoriesConfig,
    pub enrich: EnrichConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub primary: PathBuf,
    pub categories: PathBuf,
    /// The precise pass only runs when this is set
    pub precise: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary: PathBuf::from(DEFAULT_PRIMARY_SOURCE),
            categories: PathBuf::from(DEFAULT_CATEGORY_SOURCE),
            precise: Some(PathBuf::from(DEFAULT_PRECISE_SOURCE)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub postal_min: u32,
    pub postal_max: u32,
    pub progress_every: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            postal_min: DEFAULT_POSTAL_MIN,
            postal_max: DEFAULT_POSTAL_MAX,
            progress_every: DEFAULT_EXTRACT_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub progress_every: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            progress_every: DEFAULT_ENRICH_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub batch_size: usize,
    /// Delete an existing store before building
    pub fresh: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            fresh: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            file_name: "business_loader.log".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file. A missing file yields defaults
    /// only when `required` is false.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(PipelineError::Config(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.extract.postal_min > self.extract.postal_max {
            return Err(PipelineError::Config(format!(
                "postal_min ({}) is greater than postal_max ({})",
                self.extract.postal_min, self.extract.postal_max
            )));
        }
        if self.store.batch_size == 0 {
            return Err(PipelineError::Config("batch_size must be at least 1".to_string()));
        }
        if self.extract.progress_every == 0 || self.enrich.progress_every == 0 {
            return Err(PipelineError::Config(
                "progress_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a stage needs to know about the run it belongs to.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: PipelineConfig,
}

impl RunContext {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.config.store.batch_size
    }

    pub fn postal_range(&self) -> std::ops::RangeInclusive<u32> {
        self.config.extract.postal_min..=self.config.extract.postal_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [store]
            batch_size = 500

            [categories]
            collision_policy = "first_wins"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.batch_size, 500);
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.extract.postal_min, DEFAULT_POSTAL_MIN);
        assert_eq!(config.categories.collision_policy, CollisionPolicy::FirstWins);
    }

    #[test]
    fn inverted_postal_range_is_rejected() {
        let mut config = PipelineConfig::default();
        config.extract.postal_min = 14000;
        config.extract.postal_max = 10000;
        assert!(matches!(RunContext::new(config), Err(PipelineError::Config(_))));
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(&dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(config.store.batch_size, DEFAULT_BATCH_SIZE);
        assert!(PipelineConfig::load(&dir.path().join("absent.toml"), true).is_err());
    }
}
