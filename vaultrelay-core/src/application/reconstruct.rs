//! Reassembles a buffered event stream into message content.
//!
//! Blocks are emitted in the order their `content_block_stop` arrives.
//! Builder state lives only for the duration of one [`reconstruct`] call.

use crate::model::{BlockDelta, BlockSeed, StreamEvent};
use crate::types::ContentBlock;
use serde_json::{Value, json};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{trace, warn};

/// Tool arguments that did not parse as JSON.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to parse arguments of tool '{tool}' (block {index}): {reason}")]
pub struct StreamParseError {
    pub index: usize,
    pub tool: String,
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructedMessage {
    pub content: Vec<ContentBlock>,
    pub parse_errors: Vec<StreamParseError>,
}

impl ReconstructedMessage {
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

enum BlockBuilder {
    Text(String),
    ToolUse { id: String, name: String, raw: String },
}

impl BlockBuilder {
    fn from_seed(seed: &BlockSeed) -> Option<Self> {
        match seed {
            BlockSeed::Text { .. } => Some(BlockBuilder::Text(String::new())),
            BlockSeed::ToolUse { id, name } => Some(BlockBuilder::ToolUse {
                id: id.clone(),
                name: name.clone(),
                raw: String::new(),
            }),
            BlockSeed::Unsupported => None,
        }
    }

    fn apply(&mut self, delta: &BlockDelta) {
        match (self, delta) {
            (BlockBuilder::Text(text), BlockDelta::TextDelta { text: chunk }) => {
                text.push_str(chunk)
            }
            (BlockBuilder::ToolUse { raw, .. }, BlockDelta::InputJsonDelta { partial_json }) => {
                raw.push_str(partial_json)
            }
            _ => trace!("Ignoring delta that does not match its block"),
        }
    }

    fn finish(self, index: usize) -> (ContentBlock, Option<StreamParseError>) {
        match self {
            BlockBuilder::Text(text) => (ContentBlock::Text { text }, None),
            BlockBuilder::ToolUse { id, name, raw } => {
                let (input, error) = parse_arguments(index, &name, raw);
                (ContentBlock::ToolUse { id, name, input }, error)
            }
        }
    }
}

fn parse_arguments(index: usize, tool: &str, raw: String) -> (Value, Option<StreamParseError>) {
    if raw.trim().is_empty() {
        return (json!({}), None);
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => (value, None),
        Err(err) => {
            warn!(tool, index, error = %err, "Tool arguments are not valid JSON, using {{}}");
            let error = StreamParseError {
                index,
                tool: tool.to_string(),
                raw,
                reason: err.to_string(),
            };
            (json!({}), Some(error))
        }
    }
}

/// Fold a complete event sequence into content blocks.
pub fn reconstruct(events: &[StreamEvent]) -> ReconstructedMessage {
    let mut builders: HashMap<usize, BlockBuilder> = HashMap::new();
    let mut message = ReconstructedMessage::default();

    for event in events {
        match event {
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                if let Some(builder) = BlockBuilder::from_seed(content_block) {
                    builders.insert(*index, builder);
                }
            }
            StreamEvent::ContentBlockDelta { index, delta } => match builders.get_mut(index) {
                Some(builder) => builder.apply(delta),
                None => trace!(index, "Dropping delta for unknown block"),
            },
            StreamEvent::ContentBlockStop { index } => match builders.remove(index) {
                Some(builder) => {
                    let (block, error) = builder.finish(*index);
                    message.content.push(block);
                    message.parse_errors.extend(error);
                }
                None => trace!(index, "Dropping stop for unknown block"),
            },
            _ => {}
        }
    }

    if !builders.is_empty() {
        trace!(open = builders.len(), "Stream ended with unterminated blocks");
    }
    message
}
