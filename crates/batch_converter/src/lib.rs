//! Batch driver: discovers agent programs and converts each one independently.

pub mod discovery;
pub mod pipeline;
pub mod pkg_config;
pub mod processor;
pub mod report;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

pub use discovery::{canonical_path, discover_files};
pub use pipeline::{ConversionOutcome, Prepared, convert_file, convert_source, prepare, write_atomic};
pub use pkg_config::{BatchConfig, ConverterConfig, get_config, load_config_file, load_or_default};
pub use processor::process_batch;
pub use report::{BatchSummary, ConvertError, FileReport, FileStatus};

/// Owns the configuration for a run.
pub struct BatchConverter {
    cfg: Arc<ConverterConfig>,
}

impl BatchConverter {
    pub fn new(cfg: ConverterConfig) -> Self {
        Self { cfg: Arc::new(cfg) }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.cfg
    }

    /// Discover files under the configured roots.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        discover_files(&self.cfg.batch.roots, &self.cfg.batch.pattern)
    }

    /// Discover and convert. Only an inaccessible root is an error.
    pub async fn run(&self, dry_run: bool) -> Result<BatchSummary> {
        let files = self.discover()?;
        Ok(process_batch(files, self.cfg.clone(), dry_run).await)
    }
}
