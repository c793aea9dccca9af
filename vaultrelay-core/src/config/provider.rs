//! # Provider Configuration
//!
//! Connection settings for the Anthropic Messages API.
//!
//! ```toml
//! [provider]
//! endpoint = "https://api.anthropic.com"
//! api_key_env = "ANTHROPIC_API_KEY"
//! api_version = "2023-06-01"
//! ```

use crate::constants::{DEFAULT_API_KEY_ENV, DEFAULT_API_VERSION, DEFAULT_ENDPOINT};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Name of the environment variable that holds the API key
    pub api_key_env: String,
    /// Value sent in the `anthropic-version` header
    pub api_version: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(super) struct RawProviderConfig {
    pub(super) endpoint: Option<String>,
    pub(super) api_key_env: Option<String>,
    pub(super) api_version: Option<String>,
}

impl From<RawProviderConfig> for ProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            endpoint: raw.endpoint.unwrap_or(defaults.endpoint),
            api_key_env: raw.api_key_env.unwrap_or(defaults.api_key_env),
            api_version: raw.api_version.unwrap_or(defaults.api_version),
        }
    }
}
