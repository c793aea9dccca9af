use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::error::ToolInvokeError;
use crate::config::ServerConfig;

/// One entry of a server's tool catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
}

/// A live connection to a tool-providing server.
#[async_trait]
pub trait ToolServer: Send + Sync {
    fn name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ServerToolInfo>, ToolInvokeError>;

    /// Returns the raw `tools/call` result object.
    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError>;

    async fn close(&self) -> Result<(), ToolInvokeError>;
}

/// Establishes connections from configuration.
#[async_trait]
pub trait ServerConnector: Send + Sync {
    async fn connect(
        &self,
        config: &ServerConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn ToolServer>, ToolInvokeError>;
}
