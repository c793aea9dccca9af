//! # Application Layer
//!
//! ## Modules
//!
//! - `tooling` - MCP server transport and connection management
//! - `reconstruct` - event stream to message content
//! - `registry` - tool name routing and dispatch
//! - `conversation` - the model/tool round-trip loop
//! - `orchestrator` - the interactive session phases
//! - `extract`, `storage`, `interaction` - supporting pieces of a session

pub mod conversation;
pub mod extract;
pub mod interaction;
pub mod orchestrator;
pub mod reconstruct;
pub mod registry;
pub mod storage;
pub mod tooling;
