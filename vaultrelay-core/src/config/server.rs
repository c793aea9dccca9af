use serde::Deserialize;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// How to launch one MCP server over stdio.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    /// Arguments merged into every call of the named tool.
    pub tool_arguments: HashMap<String, JsonMap<String, Value>>,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
            tool_arguments: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    name: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
    #[serde(default)]
    tool_arguments: HashMap<String, JsonMap<String, Value>>,
}

impl RawServer {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let command = PathBuf::from(expand(&raw.command));
        let workdir = raw.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = raw.args.into_iter().map(|arg| expand(&arg)).collect();

        // Unset variables are left out so the child falls back to its inherited environment.
        let mut env = HashMap::with_capacity(raw.env.len());
        for (key, value) in raw.env {
            match shellexpand::full(&value) {
                Ok(expanded) => {
                    env.insert(key, expanded.into_owned());
                }
                Err(err) => {
                    warn!(server = %raw.name, variable = %key, %err, "Dropping server env entry");
                }
            }
        }

        Self {
            name: raw.name,
            command,
            args,
            env,
            workdir,
            tool_arguments: raw.tool_arguments,
        }
    }
}
