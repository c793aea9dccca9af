use super::error::ConfigError;
use super::provider::ProviderConfig;
use super::server::ServerConfig;
use super::workflow::WorkflowConfig;
use std::path::Path;

/// Application configuration loaded from client.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub max_tokens: u32,
    pub max_rounds: usize,
    pub provider: ProviderConfig,
    pub workflow: WorkflowConfig,
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text; `origin` is only used in errors
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        super::loader::parse_config(content, origin)
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|server| server.name == name)
    }
}
