//! Model types - Request and Error types

use crate::types::{ChatMessage, ToolDefinition};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// One streaming Messages API request.
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key (set {env_var})")]
    MissingApiKey { provider: String, env_var: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: StatusCode,
        body: String,
    },
    #[error("event stream from provider '{provider}' failed: {message}")]
    Stream { provider: String, message: String },
    #[error("provider '{provider}' reported {kind}: {message}")]
    Api {
        provider: String,
        kind: String,
        message: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
            env_var: env_var.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn stream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Short explanation suitable for the terminal.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { env_var, .. } => {
                format!("No API key found. Export {env_var} or add it to config/.env.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not reach '{provider}'. Check the endpoint and your network.")
                } else if source.is_timeout() {
                    format!("The request to '{provider}' timed out.")
                } else {
                    format!("Network error while talking to '{provider}'.")
                }
            }
            ModelError::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "The API key was rejected.".to_string()
                }
                StatusCode::TOO_MANY_REQUESTS => "Rate limited by the model API.".to_string(),
                other => format!("The model API answered with HTTP {}.", other.as_u16()),
            },
            ModelError::Stream { .. } => "The response stream broke off.".to_string(),
            ModelError::Api { message, .. } => format!("The model API reported: {message}"),
            ModelError::InvalidResponse { provider, .. } => {
                format!("'{provider}' returned a response that could not be processed.")
            }
        }
    }
}
