//! # Tooling
//!
//! MCP server connections: the stdio JSON-RPC transport, the connector seam
//! used to create connections, and the [`ServerManager`] that owns them for
//! the length of a session.

mod error;
mod interface;
mod manager;
mod process;

pub use error::ToolInvokeError;
pub use interface::{ServerConnector, ServerToolInfo, ToolServer};
pub use manager::ServerManager;
pub use process::{StdioConnector, StdioServer};
