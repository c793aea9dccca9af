//! Model traits

use super::events::StreamEvent;
use super::types::{ModelError, ModelRequest};
use async_trait::async_trait;

/// Trait for model provider implementations
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send a streaming request and return every event once the stream has ended.
    async fn stream(&self, request: ModelRequest) -> Result<Vec<StreamEvent>, ModelError>;
}
