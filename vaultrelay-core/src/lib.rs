//! # vaultrelay-core
//!
//! Sequential MCP client: queries a vault through a tool server, lets the
//! model draft structured output, asks the user to confirm it and submits the
//! result through a second tool server.
//!
//! ## Layout
//!
//! - [`application`] - reconstruction, tool routing, the conversation loop and
//!   the session orchestrator
//! - [`config`] - `client.toml` loading and validation
//! - [`domain`] - message and tool types shared by every layer
//! - [`infrastructure`] - the Anthropic streaming client

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{conversation, extract, interaction, orchestrator, reconstruct, registry, storage, tooling};
pub use config::{AppConfig, ConfigError, ServerConfig};
pub use domain::types;
pub use infrastructure::model;
