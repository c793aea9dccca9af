//! Anthropic Messages API client (streaming only)

use super::events::StreamEvent;
use super::traits::ModelProvider;
use super::types::{ModelError, ModelRequest};
use crate::config::ProviderConfig;
use crate::constants::MESSAGES_PATH;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Error as EventSourceError, Event, RequestBuilderExt};
use std::env;
use tracing::{debug, info, trace, warn};

const PROVIDER_ID: &str = "anthropic";

#[derive(Clone)]
pub struct AnthropicClient {
    endpoint: String,
    api_version: String,
    api_key_env: String,
    api_key: Option<String>,
    http: Client,
}

impl AnthropicClient {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key: resolve_api_key(&config.api_key_env),
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and the messages path
    pub fn messages_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        format!("{base}/{MESSAGES_PATH}")
    }

    fn require_api_key(&self) -> Result<&str, ModelError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelError::missing_api_key(PROVIDER_ID, &self.api_key_env))
    }
}

#[async_trait]
impl ModelProvider for AnthropicClient {
    async fn stream(&self, request: ModelRequest) -> Result<Vec<StreamEvent>, ModelError> {
        let api_key = self.require_api_key()?;
        let url = self.messages_url();

        info!(
            provider = PROVIDER_ID,
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending streaming request"
        );

        let mut source = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.api_version)
            .json(&request)
            .eventsource()
            .map_err(|err| ModelError::stream(PROVIDER_ID, err.to_string()))?;

        let mut events = Vec::new();
        while let Some(item) = source.next().await {
            match item {
                Ok(Event::Open) => debug!(provider = PROVIDER_ID, "Event stream opened"),
                Ok(Event::Message(message)) => {
                    let data = message.data.trim();
                    if data.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<StreamEvent>(data) {
                        Ok(StreamEvent::Error { error }) => {
                            source.close();
                            warn!(provider = PROVIDER_ID, kind = %error.kind, "Provider sent error event");
                            return Err(ModelError::Api {
                                provider: PROVIDER_ID.to_string(),
                                kind: error.kind,
                                message: error.message,
                            });
                        }
                        Ok(StreamEvent::MessageStop) => {
                            events.push(StreamEvent::MessageStop);
                            break;
                        }
                        Ok(event) => events.push(event),
                        Err(err) => {
                            trace!(error = %err, data, "Ignoring unparseable SSE payload");
                        }
                    }
                }
                Err(EventSourceError::StreamEnded) => break,
                Err(EventSourceError::InvalidStatusCode(status, response)) => {
                    source.close();
                    let body = response.text().await.unwrap_or_default();
                    return Err(ModelError::Status {
                        provider: PROVIDER_ID.to_string(),
                        status,
                        body,
                    });
                }
                Err(EventSourceError::Transport(err)) => {
                    source.close();
                    return Err(ModelError::network(PROVIDER_ID, err));
                }
                Err(other) => {
                    source.close();
                    return Err(ModelError::stream(PROVIDER_ID, other.to_string()));
                }
            }
        }
        source.close();

        if events.is_empty() {
            return Err(ModelError::invalid_response(
                PROVIDER_ID,
                "stream ended without any events",
            ));
        }
        debug!(provider = PROVIDER_ID, events = events.len(), "Event stream collected");
        Ok(events)
    }
}

/// Resolve API key from environment variable
pub fn resolve_api_key(env_var: &str) -> Option<String> {
    let name = env_var.trim();
    if name.is_empty() {
        return None;
    }
    match env::var(name) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(env_var = name, %err, "API key environment variable is not set");
            None
        }
    }
}
