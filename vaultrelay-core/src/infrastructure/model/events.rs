//! Streaming events of the Messages API
//!
//! Each SSE `data:` payload deserializes into one [`StreamEvent`]. Only the
//! `content_block_*` events carry message content; the rest are bookkeeping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        #[serde(default)]
        message: Value,
    },
    ContentBlockStart {
        index: usize,
        content_block: BlockSeed,
    },
    ContentBlockDelta {
        index: usize,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        #[serde(default)]
        delta: Value,
        #[serde(default)]
        usage: Option<Value>,
    },
    MessageStop,
    Ping,
    Error {
        error: StreamError,
    },
}

/// Initial shape of a content block announced by `content_block_start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockSeed {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl StreamEvent {
    pub fn text_start(index: usize) -> Self {
        StreamEvent::ContentBlockStart {
            index,
            content_block: BlockSeed::Text {
                text: String::new(),
            },
        }
    }

    pub fn tool_start(index: usize, id: impl Into<String>, name: impl Into<String>) -> Self {
        StreamEvent::ContentBlockStart {
            index,
            content_block: BlockSeed::ToolUse {
                id: id.into(),
                name: name.into(),
            },
        }
    }

    pub fn text_delta(index: usize, text: impl Into<String>) -> Self {
        StreamEvent::ContentBlockDelta {
            index,
            delta: BlockDelta::TextDelta { text: text.into() },
        }
    }

    pub fn json_delta(index: usize, partial_json: impl Into<String>) -> Self {
        StreamEvent::ContentBlockDelta {
            index,
            delta: BlockDelta::InputJsonDelta {
                partial_json: partial_json.into(),
            },
        }
    }

    pub fn stop(index: usize) -> Self {
        StreamEvent::ContentBlockStop { index }
    }
}
