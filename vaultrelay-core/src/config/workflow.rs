//! Settings of the vault → submission sequence.

use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_OUTPUTS_DIR, DEFAULT_PROMPTS_DIR};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_VAULT_SERVER: &str = "obsidian-api-mcp-server";
pub const DEFAULT_SUBMISSION_SERVER: &str = "originTrail";
pub const DEFAULT_QUERY_SYSTEM_PROMPT: &str = "prompt.md";
pub const DEFAULT_SUBMISSION_SYSTEM_PROMPT: &str = "dkg.md";
pub const DEFAULT_VAULT_QUESTION: &str = "What do you want to do with your Obsidian Vaults?";
pub const DEFAULT_TAILOR_QUESTION: &str = "Specify an answer for the tailored response";
pub const DEFAULT_CONFIRM_QUESTION: &str =
    "Do you want to proceed with verification of this output? (y/n): ";
pub const DEFAULT_TAILOR_INSTRUCTION: &str =
    "Make sure to use agent_id `OntologyLink`. Produce the JSON as specified in the schema.";
pub const DEFAULT_SUBMISSION_TEMPLATE: &str =
    "Please submit the following verified JSON to the DKG:\n\n{{payload}}";

/// Placeholder replaced by the extracted JSON in the submission template.
pub const PAYLOAD_PLACEHOLDER: &str = "{{payload}}";

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    pub vault_server: String,
    pub submission_server: String,
    /// System prompt file for the vault query, relative to `prompts_dir`
    pub query_system_prompt: String,
    /// System prompt file for the submission, relative to `prompts_dir`
    pub submission_system_prompt: String,
    pub prompts_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub connect_timeout: Duration,
    pub vault_question: String,
    pub tailor_question: String,
    pub confirm_question: String,
    /// Appended to the user's tailoring request
    pub tailor_instruction: String,
    pub submission_template: String,
}

impl WorkflowConfig {
    pub fn submission_prompt(&self, payload: &str) -> String {
        self.submission_template.replace(PAYLOAD_PLACEHOLDER, payload)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        RawWorkflowConfig::default().into()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(super) struct RawWorkflowConfig {
    vault_server: Option<String>,
    submission_server: Option<String>,
    query_system_prompt: Option<String>,
    submission_system_prompt: Option<String>,
    prompts_dir: Option<String>,
    outputs_dir: Option<String>,
    connect_timeout_secs: Option<u64>,
    vault_question: Option<String>,
    tailor_question: Option<String>,
    confirm_question: Option<String>,
    tailor_instruction: Option<String>,
    submission_template: Option<String>,
}

impl From<RawWorkflowConfig> for WorkflowConfig {
    fn from(raw: RawWorkflowConfig) -> Self {
        let text = |value: Option<String>, fallback: &str| value.unwrap_or_else(|| fallback.to_string());
        Self {
            vault_server: text(raw.vault_server, DEFAULT_VAULT_SERVER),
            submission_server: text(raw.submission_server, DEFAULT_SUBMISSION_SERVER),
            query_system_prompt: text(raw.query_system_prompt, DEFAULT_QUERY_SYSTEM_PROMPT),
            submission_system_prompt: text(
                raw.submission_system_prompt,
                DEFAULT_SUBMISSION_SYSTEM_PROMPT,
            ),
            prompts_dir: PathBuf::from(text(raw.prompts_dir, DEFAULT_PROMPTS_DIR)),
            outputs_dir: PathBuf::from(text(raw.outputs_dir, DEFAULT_OUTPUTS_DIR)),
            connect_timeout: raw
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            vault_question: text(raw.vault_question, DEFAULT_VAULT_QUESTION),
            tailor_question: text(raw.tailor_question, DEFAULT_TAILOR_QUESTION),
            confirm_question: text(raw.confirm_question, DEFAULT_CONFIRM_QUESTION),
            tailor_instruction: text(raw.tailor_instruction, DEFAULT_TAILOR_INSTRUCTION),
            submission_template: text(raw.submission_template, DEFAULT_SUBMISSION_TEMPLATE),
        }
    }
}
