//! # Conversation loop
//!
//! Sends the history to the model, relays requested tool calls through the
//! [`ToolRegistry`] and repeats until a reply carries no `tool_use` block.
//!
//! ```text
//! AwaitingModelResponse --tool_use--> ProcessingToolCalls
//!          ^                                  |
//!          +-------------- results -----------+
//! AwaitingModelResponse --text only--> Done
//! ```

use crate::application::reconstruct::reconstruct;
use crate::application::registry::{ToolOutcome, ToolRegistry};
use crate::config::AppConfig;
use crate::model::{ModelError, ModelProvider, ModelRequest};
use crate::types::{ChatMessage, ContentBlock, MessageRole, ToolResult};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model kept requesting tools after {limit} rounds")]
    RoundLimit { limit: usize },
}

/// Position of the loop between two model round trips.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingModelResponse,
    ProcessingToolCalls,
    Done { answer: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub max_rounds: usize,
}

impl ConversationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_rounds: config.max_rounds,
        }
    }
}

/// Result of one `run` or `follow_up`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationOutcome {
    /// Text of the final reply.
    pub answer: String,
    /// Every round's text plus tool-call notes, in order.
    pub transcript: Vec<String>,
    /// Model requests made.
    pub rounds: usize,
}

impl ConversationOutcome {
    pub fn transcript_text(&self) -> String {
        self.transcript.join("\n")
    }
}

pub struct ConversationLoop {
    provider: Arc<dyn ModelProvider>,
    settings: ConversationSettings,
    system: Option<String>,
    registry: ToolRegistry,
    history: Vec<ChatMessage>,
}

impl ConversationLoop {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        settings: ConversationSettings,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            provider,
            settings,
            system: None,
            registry,
            history: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = (!system.trim().is_empty()).then_some(system);
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Start a fresh exchange from `query`.
    pub async fn run(&mut self, query: &str) -> Result<ConversationOutcome, ConversationError> {
        self.history.clear();
        self.history.push(ChatMessage::user_text(query));
        self.drive().await
    }

    /// Continue the same history with another user message.
    pub async fn follow_up(&mut self, prompt: &str) -> Result<ConversationOutcome, ConversationError> {
        match self.history.last_mut() {
            // A user turn left open by an empty reply absorbs the prompt.
            Some(last) if last.role == MessageRole::User => {
                last.content.push(ContentBlock::text(prompt));
            }
            _ => self.history.push(ChatMessage::user_text(prompt)),
        }
        self.drive().await
    }

    async fn drive(&mut self) -> Result<ConversationOutcome, ConversationError> {
        let mut transcript = Vec::new();
        let mut rounds = 0;
        let mut state = LoopState::AwaitingModelResponse;

        loop {
            debug!(?state, rounds, "Conversation step");
            state = match state {
                LoopState::AwaitingModelResponse => {
                    if rounds >= self.settings.max_rounds {
                        warn!(limit = self.settings.max_rounds, "Round limit reached");
                        return Err(ConversationError::RoundLimit {
                            limit: self.settings.max_rounds,
                        });
                    }
                    rounds += 1;

                    let reply = self.request_reply().await?;
                    transcript.extend(reply.texts().map(str::to_string));
                    let next = if reply.has_tool_use() {
                        LoopState::ProcessingToolCalls
                    } else {
                        LoopState::Done {
                            answer: reply.texts().collect::<Vec<_>>().join("\n"),
                        }
                    };
                    if reply.content.is_empty() {
                        debug!("Empty reply left out of history");
                    } else {
                        self.history.push(reply);
                    }
                    next
                }
                LoopState::ProcessingToolCalls => {
                    let results = self.run_tool_calls(&mut transcript).await;
                    self.history.push(ChatMessage::tool_results(results));
                    LoopState::AwaitingModelResponse
                }
                LoopState::Done { answer } => {
                    info!(rounds, "Conversation finished");
                    return Ok(ConversationOutcome {
                        answer,
                        transcript,
                        rounds,
                    });
                }
            };
        }
    }

    async fn request_reply(&self) -> Result<ChatMessage, ConversationError> {
        let request = ModelRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            messages: self.history.clone(),
            tools: self.registry.available_tools().to_vec(),
            system: self.system.clone(),
            stream: true,
        };
        let events = self.provider.stream(request).await?;
        let message = reconstruct(&events);
        if !message.parse_errors.is_empty() {
            debug!(count = message.parse_errors.len(), "Reply carried malformed tool arguments");
        }
        let mut content = message.content;
        // The API rejects empty text blocks in assistant turns.
        content.retain(|block| block.as_text().is_none_or(|text| !text.is_empty()));
        Ok(ChatMessage::new(MessageRole::Assistant, content))
    }

    /// Dispatch every tool_use block of the latest reply, in order.
    async fn run_tool_calls(&self, transcript: &mut Vec<String>) -> Vec<ToolResult> {
        let Some(reply) = self.history.last() else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for tool in reply.tool_uses() {
            if self.registry.resolve(tool.name).is_some() {
                transcript.push(format!(
                    "[Calling tool {} with args {}]",
                    tool.name, tool.input
                ));
            }
            let outcome = self.registry.call(tool).await;
            if let ToolOutcome::Failed { message, .. } = &outcome {
                transcript.push(format!("[Error calling tool {}: {message}]", tool.name));
            }
            results.push(outcome.into_result());
        }
        results
    }
}
