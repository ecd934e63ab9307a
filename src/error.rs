use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors. Any of these aborts the run with a non-zero exit.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Source file {} could not be parsed: {reason}", path.display())]
    SourceUnparseable { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Map an open failure to `SourceNotFound` when the file is missing.
    pub fn from_open(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            PipelineError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PipelineError::Io(err)
        }
    }
}

/// Per-record problems. These are logged, counted and skipped; they never
/// abort a run.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("line {line}: malformed record: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("line {line}: missing required field `{field}`")]
    MissingRequiredField { line: u64, field: &'static str },

    #[error("failed to write business {id}: {source}")]
    StorageWrite {
        id: String,
        #[source]
        source: rusqlite::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
