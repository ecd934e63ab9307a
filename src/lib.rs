pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod reference;
pub mod storage;
pub mod types;

pub use config::{PipelineConfig, RunContext};
pub use error::{PipelineError, RecordError, Result};
pub use pipeline::{Pipeline, PipelineResult};
