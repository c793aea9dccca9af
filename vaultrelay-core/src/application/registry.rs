//! Tool name routing across connected servers.

use crate::application::tooling::{ToolInvokeError, ToolServer};
use crate::types::{ToolDefinition, ToolResult, ToolUse, text_segment};
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-tool arguments merged into every call of that tool.
pub type ArgumentOverrides = HashMap<String, JsonMap<String, Value>>;

/// What happened to one dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// No connected server provides the tool.
    NotFound(ToolResult),
    /// The server answered; the result may still carry `is_error`.
    Completed(ToolResult),
    /// The call never produced an answer.
    Failed { message: String, result: ToolResult },
}

impl ToolOutcome {
    pub fn result(&self) -> &ToolResult {
        match self {
            ToolOutcome::NotFound(result) | ToolOutcome::Completed(result) => result,
            ToolOutcome::Failed { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ToolResult {
        match self {
            ToolOutcome::NotFound(result) | ToolOutcome::Completed(result) => result,
            ToolOutcome::Failed { result, .. } => result,
        }
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    routes: HashMap<String, String>,
    servers: HashMap<String, Arc<dyn ToolServer>>,
    overrides: ArgumentOverrides,
}

impl ToolRegistry {
    /// Collect the catalogs of `servers`, optionally restricted to `filter`.
    ///
    /// The first server to register a tool name owns it.
    pub async fn build(servers: &[Arc<dyn ToolServer>], filter: Option<&[String]>) -> Self {
        let mut registry = Self::default();

        for server in servers {
            let server_name = server.name();
            if let Some(allowed) = filter {
                if !allowed.iter().any(|name| name == server_name) {
                    continue;
                }
            }

            let catalog = match server.list_tools().await {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!(server = %server_name, %err, "Error listing tools");
                    continue;
                }
            };

            let mut registered = Vec::with_capacity(catalog.len());
            for tool in catalog {
                if let Some(owner) = registry.routes.get(&tool.name) {
                    warn!(
                        tool = %tool.name,
                        server = %server_name,
                        owner = %owner,
                        "Duplicate tool name, keeping the first registration"
                    );
                    continue;
                }
                registry
                    .routes
                    .insert(tool.name.clone(), server_name.to_string());
                registered.push(tool.name.clone());
                registry.tools.push(ToolDefinition::new(
                    tool.name,
                    tool.description,
                    tool.input_schema,
                ));
            }

            info!(server = %server_name, tools = ?registered, "Tools available");
            registry
                .servers
                .insert(server_name.to_string(), Arc::clone(server));
        }

        registry
    }

    pub fn with_argument_overrides(mut self, overrides: ArgumentOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn available_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn resolve(&self, tool: &str) -> Option<&str> {
        self.routes.get(tool).map(String::as_str)
    }

    /// Run one tool call; failures become error results.
    pub async fn dispatch(&self, tool: ToolUse<'_>) -> ToolResult {
        self.call(tool).await.into_result()
    }

    pub async fn call(&self, tool: ToolUse<'_>) -> ToolOutcome {
        let Some(server) = self
            .resolve(tool.name)
            .and_then(|name| self.servers.get(name))
        else {
            warn!(tool = %tool.name, "Tool not found in any connected server");
            return ToolOutcome::NotFound(ToolResult::error(
                tool.id,
                format!("Tool {} not found", tool.name),
            ));
        };

        let arguments = self.arguments_for(tool.name, tool.input);
        debug!(tool = %tool.name, server = %server.name(), %arguments, "Executing tool");

        match server.call_tool(tool.name, arguments).await {
            Ok(raw) => {
                info!(tool = %tool.name, "Tool completed");
                ToolOutcome::Completed(tool_result_from_call(tool.id, raw))
            }
            Err(err) => {
                warn!(tool = %tool.name, %err, "Error calling tool");
                let message = failure_message(&err);
                let result = ToolResult::error(tool.id, &message);
                ToolOutcome::Failed { message, result }
            }
        }
    }

    fn arguments_for(&self, tool: &str, input: &Value) -> Value {
        let Some(extra) = self.overrides.get(tool) else {
            return input.clone();
        };
        let mut arguments = match input {
            Value::Object(map) => map.clone(),
            Value::Null => JsonMap::new(),
            other => return other.clone(),
        };
        for (key, value) in extra {
            arguments.insert(key.clone(), value.clone());
        }
        Value::Object(arguments)
    }
}

fn failure_message(err: &ToolInvokeError) -> String {
    match err {
        ToolInvokeError::Rpc { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Convert a raw `tools/call` result into a model-facing tool result.
pub fn tool_result_from_call(tool_use_id: &str, raw: Value) -> ToolResult {
    let is_error = raw.get("isError").and_then(Value::as_bool).unwrap_or(false);

    let segments: Vec<Value> = raw
        .get("content")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_segment).collect())
        .unwrap_or_default();

    let content = if segments.is_empty() {
        let text = match &raw {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        vec![text_segment(text)]
    } else {
        segments
    };

    ToolResult {
        tool_use_id: tool_use_id.to_string(),
        content,
        is_error,
    }
}

fn normalize_segment(segment: &Value) -> Value {
    match segment.get("type").and_then(Value::as_str) {
        Some("text") if segment.get("text").is_some_and(Value::is_string) => segment.clone(),
        Some("image") => segment.clone(),
        Some("resource") => match segment.pointer("/resource/text").and_then(Value::as_str) {
            Some(text) => text_segment(text),
            None => text_segment(segment.to_string()),
        },
        _ => text_segment(segment.to_string()),
    }
}
