use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no servers configured - at least one [[servers]] entry is required")]
    NoServersConfigured,

    #[error("server '{name}' is configured more than once")]
    DuplicateServer { name: String },

    #[error("workflow {role} server '{server}' not found in configured servers")]
    UnknownWorkflowServer { role: &'static str, server: String },

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("max_rounds must be greater than zero")]
    InvalidMaxRounds,
}
