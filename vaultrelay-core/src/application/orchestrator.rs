//! # Session orchestrator
//!
//! Drives one interactive session through its phases:
//!
//! ```text
//! VaultQuery -> TailoredAnswer -> Confirmation -> Submission -> Completed
//!                                      |
//!                                      +-> Aborted
//! ```
//!
//! Every server connection is closed when [`SessionOrchestrator::run`]
//! returns, whichever way it returns.

use crate::application::conversation::{
    ConversationError, ConversationLoop, ConversationOutcome, ConversationSettings,
};
use crate::application::extract::{ExtractionError, extract_json};
use crate::application::interaction::UserInteraction;
use crate::application::registry::{ArgumentOverrides, ToolRegistry};
use crate::application::storage::{OutputStore, PromptStore};
use crate::application::tooling::{ServerConnector, ServerManager, StdioConnector, ToolInvokeError};
use crate::config::{AppConfig, WorkflowConfig};
use crate::model::ModelProvider;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

const VAULT_SETUP_HINTS: &str = "Could not connect to the Obsidian vault server. Check that:
  - uvx is installed and on PATH
  - OBSIDIAN_API_KEY is set
  - the Obsidian Local REST API plugin is enabled";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connection(#[from] ToolInvokeError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error("could not extract valid JSON from the verified output")]
    Extraction(#[from] ExtractionError),
    #[error("failed to read prompt '{}': {source}", .path.display())]
    Prompt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("terminal interaction failed: {0}")]
    Interaction(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    VaultQuery,
    TailoredAnswer,
    Confirmation,
    Submission,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The payload was saved and handed to the submission server.
    Submitted { path: PathBuf, result: String },
    /// The user rejected the draft; nothing was written.
    Declined,
}

/// Phase together with the data it carries forward.
enum Step {
    VaultQuery,
    TailoredAnswer(ConversationLoop),
    Confirmation(String),
    Submission(String),
    Completed(SessionOutcome),
}

impl Step {
    fn phase(&self) -> Phase {
        match self {
            Step::VaultQuery => Phase::VaultQuery,
            Step::TailoredAnswer(_) => Phase::TailoredAnswer,
            Step::Confirmation(_) => Phase::Confirmation,
            Step::Submission(_) => Phase::Submission,
            Step::Completed(SessionOutcome::Declined) => Phase::Aborted,
            Step::Completed(_) => Phase::Completed,
        }
    }
}

pub struct SessionOrchestrator {
    provider: Arc<dyn ModelProvider>,
    interaction: Arc<dyn UserInteraction>,
    manager: ServerManager,
    settings: ConversationSettings,
    workflow: WorkflowConfig,
    overrides: ArgumentOverrides,
    prompts: PromptStore,
    outputs: OutputStore,
}

impl SessionOrchestrator {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn ModelProvider>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self::with_connector(config, provider, interaction, Arc::new(StdioConnector))
    }

    pub fn with_connector(
        config: &AppConfig,
        provider: Arc<dyn ModelProvider>,
        interaction: Arc<dyn UserInteraction>,
        connector: Arc<dyn ServerConnector>,
    ) -> Self {
        let workflow = config.workflow.clone();
        let overrides = config
            .servers
            .iter()
            .flat_map(|server| server.tool_arguments.clone())
            .collect();
        Self {
            provider,
            interaction,
            manager: ServerManager::with_connector(
                config.servers.clone(),
                workflow.connect_timeout,
                connector,
            ),
            settings: ConversationSettings::from_config(config),
            prompts: PromptStore::new(&workflow.prompts_dir),
            outputs: OutputStore::new(&workflow.outputs_dir),
            overrides,
            workflow,
        }
    }

    /// Run the whole session; connections are closed before returning.
    pub async fn run(&mut self, session_id: &str) -> Result<SessionOutcome, SessionError> {
        let result = self.run_phases(session_id).await;
        if let Err(err) = &result {
            error!(session = session_id, %err, "Session failed");
        }
        self.manager.disconnect_all().await;
        result
    }

    async fn run_phases(&mut self, session_id: &str) -> Result<SessionOutcome, SessionError> {
        self.show(&format!("\nStarting sequential chat with ID: {session_id}\n"))
            .await?;

        let mut step = Step::VaultQuery;
        loop {
            info!(session = session_id, phase = ?step.phase(), "Entering phase");
            step = match step {
                Step::VaultQuery => Step::TailoredAnswer(self.vault_query().await?),
                Step::TailoredAnswer(conversation) => {
                    Step::Confirmation(self.tailored_answer(conversation).await?)
                }
                Step::Confirmation(draft) => {
                    if self.confirm(&draft).await? {
                        Step::Submission(draft)
                    } else {
                        self.show("User cancelled the sequence.").await?;
                        Step::Completed(SessionOutcome::Declined)
                    }
                }
                Step::Submission(draft) => Step::Completed(self.submit(session_id, &draft).await?),
                Step::Completed(outcome) => {
                    if matches!(outcome, SessionOutcome::Submitted { .. }) {
                        let dir = self.outputs.session_dir(session_id);
                        self.show(&format!(
                            "\n=== SEQUENCE COMPLETED ===\nAll outputs saved in: {}/",
                            dir.display()
                        ))
                        .await?;
                    }
                    return Ok(outcome);
                }
            };
        }
    }

    async fn vault_query(&mut self) -> Result<ConversationLoop, SessionError> {
        self.show("=== STEP 1: Initial Query with Obsidian Vault ===").await?;
        let server = self.workflow.vault_server.clone();
        if let Err(err) = self.manager.connect(&server).await {
            warn!(server = %server, %err, "Vault server unavailable");
            self.show(VAULT_SETUP_HINTS).await?;
            return Err(err.into());
        }

        let query = self.ask(&self.workflow.vault_question).await?;
        let system = self.load_prompt(&self.workflow.query_system_prompt).await?;
        let mut conversation = self.conversation(&server, system).await;

        let outcome = conversation.run(&query).await?;
        self.show_transcript(&outcome).await?;
        Ok(conversation)
    }

    async fn tailored_answer(
        &self,
        mut conversation: ConversationLoop,
    ) -> Result<String, SessionError> {
        let request = self.ask(&self.workflow.tailor_question).await?;
        let prompt = format!("{request}\n{}", self.workflow.tailor_instruction);
        let outcome = conversation.follow_up(&prompt).await?;
        Ok(outcome.answer)
    }

    async fn confirm(&self, draft: &str) -> Result<bool, SessionError> {
        self.show(&format!(
            "\n--- VERIFIED JSON OUTPUT ---\n{draft}\n--- END VERIFIED OUTPUT ---\n"
        ))
        .await?;
        self.interaction
            .confirm(&self.workflow.confirm_question)
            .await
            .map_err(SessionError::Interaction)
    }

    async fn submit(&mut self, session_id: &str, draft: &str) -> Result<SessionOutcome, SessionError> {
        let payload = extract_json(draft)?;
        let path = self
            .outputs
            .save_public(session_id, payload)
            .await
            .map_err(|source| SessionError::Output {
                path: self.outputs.public_path(session_id),
                source,
            })?;
        self.show(&format!("\nVerified JSON saved to: {}", path.display()))
            .await?;

        self.show("\n=== STEP 3: DKG Submission ===").await?;
        self.manager.disconnect_all().await;
        let server = self.workflow.submission_server.clone();
        self.manager.connect(&server).await?;

        let system = self
            .load_prompt(&self.workflow.submission_system_prompt)
            .await?;
        let mut conversation = self.conversation(&server, system).await;
        let outcome = conversation
            .run(&self.workflow.submission_prompt(payload))
            .await?;

        self.show(&format!(
            "\n--- DKG SUBMISSION RESULT ---\n{}\n--- END DKG RESULT ---\n",
            outcome.transcript_text()
        ))
        .await?;

        Ok(SessionOutcome::Submitted {
            path,
            result: outcome.answer,
        })
    }

    async fn conversation(&self, server: &str, system: String) -> ConversationLoop {
        let filter = [server.to_string()];
        let registry = ToolRegistry::build(self.manager.connected(), Some(filter.as_slice()))
            .await
            .with_argument_overrides(self.overrides.clone());
        ConversationLoop::new(Arc::clone(&self.provider), self.settings.clone(), registry)
            .with_system_prompt(system)
    }

    async fn load_prompt(&self, name: &str) -> Result<String, SessionError> {
        self.prompts
            .load(name)
            .await
            .map_err(|source| SessionError::Prompt {
                path: self.prompts.path_of(name),
                source,
            })
    }

    async fn show_transcript(&self, outcome: &ConversationOutcome) -> Result<(), SessionError> {
        self.show(&outcome.transcript_text()).await
    }

    async fn show(&self, text: &str) -> Result<(), SessionError> {
        self.interaction
            .show(text)
            .await
            .map_err(SessionError::Interaction)
    }

    async fn ask(&self, question: &str) -> Result<String, SessionError> {
        self.interaction
            .ask(question)
            .await
            .map_err(SessionError::Interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tooling::{ServerToolInfo, ToolServer};
    use crate::config::ServerConfig;
    use crate::model::{ModelError, ModelRequest, StreamEvent};
    use crate::types::ContentBlock;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    const CONFIG: &str = r#"
        [[servers]]
        name = "obsidian-api-mcp-server"
        command = "vault-server"

        [servers.tool_arguments.search_vault]
        context_length = 64000

        [[servers]]
        name = "originTrail"
        command = "dkg-server"
    "#;

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    impl Journal {
        async fn push(&self, entry: impl Into<String>) {
            self.entries.lock().await.push(entry.into());
        }

        async fn entries(&self) -> Vec<String> {
            self.entries.lock().await.clone()
        }
    }

    struct StubServer {
        name: String,
        journal: Arc<Journal>,
    }

    #[async_trait]
    impl ToolServer for StubServer {
        fn name(&self) -> &str {
            &self.name
        }

        async fn list_tools(&self) -> Result<Vec<ServerToolInfo>, ToolInvokeError> {
            let tool = if self.name == "originTrail" {
                "dkg_create"
            } else {
                "search_vault"
            };
            Ok(vec![ServerToolInfo {
                name: tool.into(),
                description: None,
                input_schema: None,
            }])
        }

        async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
            self.journal
                .push(format!("call {}.{tool} {arguments}", self.name))
                .await;
            Ok(json!({ "content": [{ "type": "text", "text": "tool output" }] }))
        }

        async fn close(&self) -> Result<(), ToolInvokeError> {
            self.journal.push(format!("close {}", self.name)).await;
            Ok(())
        }
    }

    struct StubConnector {
        journal: Arc<Journal>,
        refuse: Option<&'static str>,
    }

    #[async_trait]
    impl ServerConnector for StubConnector {
        async fn connect(
            &self,
            config: &ServerConfig,
            timeout: Duration,
        ) -> Result<Arc<dyn ToolServer>, ToolInvokeError> {
            if self.refuse == Some(config.name.as_str()) {
                return Err(ToolInvokeError::ConnectTimeout {
                    server: config.name.clone(),
                    timeout,
                });
            }
            self.journal.push(format!("connect {}", config.name)).await;
            Ok(Arc::new(StubServer {
                name: config.name.clone(),
                journal: self.journal.clone(),
            }))
        }
    }

    struct ScriptedProvider {
        replies: Mutex<Vec<Vec<StreamEvent>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Vec<StreamEvent>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn stream(&self, request: ModelRequest) -> Result<Vec<StreamEvent>, ModelError> {
            self.requests.lock().await.push(request);
            let mut replies = self.replies.lock().await;
            if replies.is_empty() {
                return Err(ModelError::invalid_response("scripted", "script exhausted"));
            }
            Ok(replies.remove(0))
        }
    }

    struct ScriptedUser {
        answers: Mutex<Vec<&'static str>>,
        shown: Mutex<Vec<String>>,
    }

    impl ScriptedUser {
        fn new(answers: Vec<&'static str>) -> Self {
            Self {
                answers: Mutex::new(answers),
                shown: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl UserInteraction for ScriptedUser {
        async fn show(&self, text: &str) -> io::Result<()> {
            self.shown.lock().await.push(text.to_string());
            Ok(())
        }

        async fn ask(&self, _question: &str) -> io::Result<String> {
            let mut answers = self.answers.lock().await;
            if answers.is_empty() {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no answer"));
            }
            Ok(answers.remove(0).to_string())
        }
    }

    fn text_reply(text: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::text_start(0),
            StreamEvent::text_delta(0, text),
            StreamEvent::stop(0),
        ]
    }

    fn tool_reply(id: &str, name: &str, args: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::tool_start(0, id, name),
            StreamEvent::json_delta(0, args),
            StreamEvent::stop(0),
        ]
    }

    fn config(dir: &Path) -> AppConfig {
        let prompts = dir.join("prompts");
        std::fs::create_dir_all(&prompts).expect("prompts dir");
        std::fs::write(prompts.join("prompt.md"), "Search the vault.").expect("prompt");
        std::fs::write(prompts.join("dkg.md"), "Publish to the DKG.").expect("dkg prompt");

        let mut config =
            AppConfig::from_toml_str(CONFIG, Path::new("client.toml")).expect("config parses");
        config.workflow.prompts_dir = prompts;
        config.workflow.outputs_dir = dir.join("outputs");
        config
    }

    fn orchestrator(
        config: &AppConfig,
        provider: Arc<ScriptedProvider>,
        user: Arc<ScriptedUser>,
        journal: Arc<Journal>,
        refuse: Option<&'static str>,
    ) -> SessionOrchestrator {
        SessionOrchestrator::with_connector(
            config,
            provider,
            user,
            Arc::new(StubConnector { journal, refuse }),
        )
    }

    #[tokio::test]
    async fn declining_writes_nothing_and_skips_submission() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let journal = Arc::new(Journal::default());
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_reply("Found three notes."),
            text_reply("```json\n{\"name\":\"x\"}\n```"),
        ]));
        let user = Arc::new(ScriptedUser::new(vec!["find notes", "as json", "n"]));

        let outcome = orchestrator(&config, provider.clone(), user.clone(), journal.clone(), None)
            .run("session-a")
            .await
            .expect("session runs");

        assert_eq!(outcome, SessionOutcome::Declined);
        assert!(!dir.path().join("outputs").exists());
        assert_eq!(
            journal.entries().await,
            vec!["connect obsidian-api-mcp-server", "close obsidian-api-mcp-server"]
        );
        assert_eq!(provider.requests.lock().await.len(), 2);
        assert!(
            user.shown
                .lock()
                .await
                .iter()
                .any(|text| text == "User cancelled the sequence.")
        );
    }

    #[tokio::test]
    async fn confirmed_draft_is_saved_and_submitted() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let journal = Arc::new(Journal::default());
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_reply("t1", "search_vault", "{\"query\":\"ontology\"}"),
            text_reply("Found it."),
            text_reply("Draft:\n```json\n{\"name\":\"x\"}\n```"),
            tool_reply("t2", "dkg_create", "{\"content\":{}}"),
            text_reply("Published UAL did:dkg:1"),
        ]));
        let user = Arc::new(ScriptedUser::new(vec!["find ontology", "tailor it", "Yes"]));

        let outcome = orchestrator(&config, provider.clone(), user, journal.clone(), None)
            .run("session-b")
            .await
            .expect("session runs");

        let public = dir.path().join("outputs/session-b/public.json");
        assert_eq!(
            outcome,
            SessionOutcome::Submitted {
                path: public.clone(),
                result: "Published UAL did:dkg:1".into(),
            }
        );
        assert_eq!(std::fs::read_to_string(&public).expect("saved"), "{\"name\":\"x\"}");

        assert_eq!(
            journal.entries().await,
            vec![
                "connect obsidian-api-mcp-server".to_string(),
                "call obsidian-api-mcp-server.search_vault {\"context_length\":64000,\"query\":\"ontology\"}".to_string(),
                "close obsidian-api-mcp-server".to_string(),
                "connect originTrail".to_string(),
                "call originTrail.dkg_create {\"content\":{}}".to_string(),
                "close originTrail".to_string(),
            ]
        );

        let requests = provider.requests.lock().await;
        assert_eq!(requests[0].system.as_deref(), Some("Search the vault."));
        assert_eq!(requests[0].tools[0].name, "search_vault");
        let tailored = &requests[2].messages[4];
        assert_eq!(
            tailored.content,
            vec![ContentBlock::text(format!(
                "tailor it\n{}",
                config.workflow.tailor_instruction
            ))]
        );
        assert_eq!(requests[3].system.as_deref(), Some("Publish to the DKG."));
        assert_eq!(requests[3].tools[0].name, "dkg_create");
        assert_eq!(
            requests[3].messages[0].texts().collect::<Vec<_>>(),
            vec!["Please submit the following verified JSON to the DKG:\n\n{\"name\":\"x\"}"]
        );
    }

    #[tokio::test]
    async fn draft_without_json_is_an_extraction_error() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let journal = Arc::new(Journal::default());
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_reply("Nothing useful."),
            text_reply("still no json"),
        ]));
        let user = Arc::new(ScriptedUser::new(vec!["q", "t", "y"]));

        let err = orchestrator(&config, provider, user, journal.clone(), None)
            .run("session-c")
            .await
            .expect_err("extraction fails");

        assert!(matches!(err, SessionError::Extraction(_)));
        assert_eq!(
            journal.entries().await.last().map(String::as_str),
            Some("close obsidian-api-mcp-server")
        );
    }

    #[tokio::test]
    async fn submission_connect_failure_still_cleans_up() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let journal = Arc::new(Journal::default());
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_reply("Found."),
            text_reply("{\"name\":\"x\"}"),
        ]));
        let user = Arc::new(ScriptedUser::new(vec!["q", "t", "y"]));

        let err = orchestrator(&config, provider, user, journal.clone(), Some("originTrail"))
            .run("session-d")
            .await
            .expect_err("connect fails");

        assert!(matches!(
            err,
            SessionError::Connection(ToolInvokeError::ConnectTimeout { .. })
        ));
        assert_eq!(
            journal.entries().await,
            vec!["connect obsidian-api-mcp-server", "close obsidian-api-mcp-server"]
        );
        assert!(dir.path().join("outputs/session-d/public.json").exists());
    }

    #[tokio::test]
    async fn vault_connect_failure_shows_setup_hints() {
        let dir = tempdir().expect("tempdir");
        let config = config(dir.path());
        let journal = Arc::new(Journal::default());
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let user = Arc::new(ScriptedUser::new(Vec::new()));

        let err = orchestrator(
            &config,
            provider.clone(),
            user.clone(),
            journal.clone(),
            Some("obsidian-api-mcp-server"),
        )
        .run("session-f")
        .await
        .expect_err("connect fails");

        assert!(matches!(err, SessionError::Connection(_)));
        let shown = user.shown.lock().await;
        let hints = shown.last().expect("hints shown");
        assert!(hints.contains("OBSIDIAN_API_KEY"));
        assert!(hints.contains("Local REST API"));
        assert!(journal.entries().await.is_empty());
        assert!(provider.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn missing_prompt_file_is_reported() {
        let dir = tempdir().expect("tempdir");
        let mut config = config(dir.path());
        config.workflow.query_system_prompt = "absent.md".into();
        let journal = Arc::new(Journal::default());
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let user = Arc::new(ScriptedUser::new(vec!["q"]));

        let err = orchestrator(&config, provider, user, journal.clone(), None)
            .run("session-e")
            .await
            .expect_err("prompt missing");

        assert!(matches!(err, SessionError::Prompt { ref path, .. } if path.ends_with("absent.md")));
        assert_eq!(
            journal.entries().await.last().map(String::as_str),
            Some("close obsidian-api-mcp-server")
        );
    }
}
