//! Application constants
//!
//! Single source of truth for paths and protocol defaults.

use std::time::Duration;

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/client.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Default Anthropic Messages API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Messages API path appended to the endpoint
pub const MESSAGES_PATH: &str = "v1/messages";

/// Value of the `anthropic-version` header
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Environment variable holding the API key unless configured otherwise
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable that overrides the configured model
pub const MODEL_ENV: &str = "ANTHROPIC_MODEL";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub const DEFAULT_MAX_TOKENS: u32 = 64_000;

/// Upper bound on model requests per conversation run
pub const DEFAULT_MAX_ROUNDS: usize = 25;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_PROMPTS_DIR: &str = "prompts";

pub const DEFAULT_OUTPUTS_DIR: &str = "outputs";

/// Vault search tool whose context window follows `max_tokens`
pub const SEARCH_VAULT_TOOL: &str = "search_vault";

pub const CONTEXT_LENGTH_ARG: &str = "context_length";

/// File name of the verified JSON inside a session's output directory
pub const PUBLIC_OUTPUT_FILE: &str = "public.json";

/// MCP protocol revision sent during `initialize`
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";
