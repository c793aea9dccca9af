//! # Model Infrastructure
//!
//! Streaming access to the LLM API.
//!
//! ## Structure
//!
//! - `events` - `StreamEvent` and its block seed / delta variants
//! - `types` - `ModelRequest` and `ModelError`
//! - `traits` - the `ModelProvider` seam used by the conversation loop
//! - `anthropic` - Messages API client over SSE

mod anthropic;
mod events;
mod traits;
mod types;

pub use anthropic::{AnthropicClient, resolve_api_key};
pub use events::{BlockDelta, BlockSeed, StreamError, StreamEvent};
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest};
