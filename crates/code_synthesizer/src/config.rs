use react_runtime::client::{DEFAULT_API_KEY, DEFAULT_BASE_URL, DEFAULT_MODEL};
use react_runtime::protocol::DEFAULT_MAX_ITERATIONS;
use serde::Deserialize;

/// Defaults baked into the generated program's command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_model: String,
    pub default_base_url: String,
    pub default_api_key: String,
    pub max_iterations: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_base_url: DEFAULT_BASE_URL.to_string(),
            default_api_key: DEFAULT_API_KEY.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}
