use config::{Config, File};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use code_synthesizer::GenerationConfig;
use source_extractor::ExtractionConfig;

pub const DEFAULT_PATTERN: &str = "react_*.py";
pub const DEFAULT_CONCURRENT_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directories searched for agent programs.
    pub roots: Vec<PathBuf>,
    /// Glob matched against file names.
    pub pattern: String,
    pub concurrent_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            pattern: DEFAULT_PATTERN.to_string(),
            concurrent_limit: DEFAULT_CONCURRENT_LIMIT,
        }
    }
}

/// Contents of `config/config.toml`. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub batch: BatchConfig,
    pub extraction: ExtractionConfig,
    pub generation: GenerationConfig,
}

pub fn get_config() -> Result<ConverterConfig, config::ConfigError> {
    // Try multiple possible paths for the config file
    let possible_paths = [
        "config/config.toml",       // From project root
        "../config/config.toml",    // From crates subdirectory
        "../../config/config.toml", // From deeper nested directories
    ];

    let Some(path) = possible_paths
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
    else {
        return Err(config::ConfigError::NotFound(
            "config.toml not found in any expected location".to_string(),
        ));
    };

    load_config_file(path)
}

pub fn load_config_file(path: &Path) -> Result<ConverterConfig, config::ConfigError> {
    Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize()
}

/// An explicit path must load; otherwise a missing file means built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConverterConfig, config::ConfigError> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }
    match get_config() {
        Err(config::ConfigError::NotFound(msg)) => {
            warn!("{}; using built-in defaults", msg);
            Ok(ConverterConfig::default())
        }
        other => other,
    }
}
