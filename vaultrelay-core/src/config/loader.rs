use super::error::ConfigError;
use super::provider::RawProviderConfig;
use super::server::{RawServer, ServerConfig};
use super::workflow::RawWorkflowConfig;
use crate::constants::{
    CONFIG_PATH, CONTEXT_LENGTH_ARG, DEFAULT_MAX_ROUNDS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    ENV_PATH, MODEL_ENV, SEARCH_VAULT_TOOL,
};
use dotenvy::{dotenv, from_filename};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_rounds: Option<usize>,
    #[serde(default)]
    pub provider: RawProviderConfig,
    #[serde(default)]
    pub workflow: RawWorkflowConfig,
    #[serde(default)]
    pub servers: Vec<RawServer>,
}

/// Ensures environment variables are loaded from config/.env and ./.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
        let _ = dotenv();
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<super::AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str, origin: &Path) -> Result<super::AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<super::AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

fn validate_and_build(parsed: RawConfig) -> Result<super::AppConfig, ConfigError> {
    if parsed.servers.is_empty() {
        return Err(ConfigError::NoServersConfigured);
    }

    let mut seen = HashSet::new();
    for server in &parsed.servers {
        if !seen.insert(server.name().to_string()) {
            return Err(ConfigError::DuplicateServer {
                name: server.name().to_string(),
            });
        }
    }

    let workflow: super::WorkflowConfig = parsed.workflow.into();
    for (role, server) in [
        ("vault", &workflow.vault_server),
        ("submission", &workflow.submission_server),
    ] {
        if !seen.contains(server.as_str()) {
            return Err(ConfigError::UnknownWorkflowServer {
                role,
                server: server.clone(),
            });
        }
    }

    let max_tokens = parsed.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    if max_tokens == 0 {
        return Err(ConfigError::InvalidMaxTokens);
    }

    let max_rounds = parsed.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS);
    if max_rounds == 0 {
        return Err(ConfigError::InvalidMaxRounds);
    }

    let model = env::var(MODEL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or(parsed.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut servers: Vec<ServerConfig> =
        parsed.servers.into_iter().map(ServerConfig::from).collect();
    if let Some(vault) = servers
        .iter_mut()
        .find(|server| server.name == workflow.vault_server)
    {
        vault
            .tool_arguments
            .entry(SEARCH_VAULT_TOOL.to_string())
            .or_default()
            .entry(CONTEXT_LENGTH_ARG)
            .or_insert_with(|| Value::from(max_tokens));
    }

    Ok(super::AppConfig {
        model,
        max_tokens,
        max_rounds,
        provider: parsed.provider.into(),
        workflow,
        servers,
    })
}
