// Config loading tests - AppConfig::load defaults and validation errors

use serde_json::json;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;
use vaultrelay_core::config::{AppConfig, ConfigError};

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("client.toml");
    fs::write(&path, content).expect("Failed to write client.toml");
    path
}

fn both_servers() -> &'static str {
    r#"
[[servers]]
name = "obsidian-api-mcp-server"
command = "uvx"
args = ["--from", "obsidian-api-mcp-server>=1.0.1", "obsidian-api-mcp"]

[servers.env]
OBSIDIAN_API_URL = "http://127.0.0.1:27123/"

[servers.tool_arguments.search_vault]
context_length = 64000

[[servers]]
name = "originTrail"
command = "python"
args = ["dkg_server.py", "--transport", "stdio"]
"#
}

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/client.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn returns_error_on_invalid_toml() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[[servers]\nname = ");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn returns_error_without_servers() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "model = \"claude\"\n");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::NoServersConfigured)));
}

#[test]
fn returns_error_on_duplicate_server_names() {
    let dir = tempdir().expect("tempdir");
    let content = format!(
        "{}\n[[servers]]\nname = \"originTrail\"\ncommand = \"other\"\n",
        both_servers()
    );
    let path = write_config(dir.path(), &content);
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::DuplicateServer { name }) if name == "originTrail"));
}

#[test]
fn returns_error_when_workflow_server_is_missing() {
    let dir = tempdir().expect("tempdir");
    let content = format!("{}\n[workflow]\nsubmission_server = \"ledger\"\n", both_servers());
    let path = write_config(dir.path(), &content);
    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::UnknownWorkflowServer { role: "submission", server }) if server == "ledger"
    ));
}

#[test]
fn returns_error_on_zero_max_tokens() {
    let dir = tempdir().expect("tempdir");
    let content = format!("max_tokens = 0\n{}", both_servers());
    let path = write_config(dir.path(), &content);
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::InvalidMaxTokens)));
}

#[test]
fn returns_error_on_zero_max_rounds() {
    let dir = tempdir().expect("tempdir");
    let content = format!("max_rounds = 0\n{}", both_servers());
    let path = write_config(dir.path(), &content);
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::InvalidMaxRounds)));
}

#[test]
#[serial]
fn applies_defaults() {
    unsafe {
        env::remove_var("ANTHROPIC_MODEL");
    }
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), both_servers());
    let config = AppConfig::load(Some(&path)).expect("config loads");

    assert_eq!(config.model, "claude-sonnet-4-20250514");
    assert_eq!(config.max_tokens, 64_000);
    assert_eq!(config.max_rounds, 25);
    assert_eq!(config.provider.endpoint, "https://api.anthropic.com");
    assert_eq!(config.provider.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(config.provider.api_version, "2023-06-01");
    assert_eq!(config.workflow.vault_server, "obsidian-api-mcp-server");
    assert_eq!(config.workflow.submission_server, "originTrail");
    assert_eq!(config.workflow.prompts_dir, PathBuf::from("prompts"));
    assert_eq!(config.workflow.outputs_dir, PathBuf::from("outputs"));
    assert_eq!(config.workflow.connect_timeout, Duration::from_secs(30));
    assert_eq!(
        config.workflow.submission_prompt("{}"),
        "Please submit the following verified JSON to the DKG:\n\n{}"
    );
}

#[test]
#[serial]
fn model_env_overrides_file() {
    unsafe {
        env::set_var("ANTHROPIC_MODEL", "claude-from-env");
    }
    let dir = tempdir().expect("tempdir");
    let content = format!("model = \"claude-from-file\"\n{}", both_servers());
    let path = write_config(dir.path(), &content);
    let from_env = AppConfig::load(Some(&path)).expect("config loads");

    unsafe {
        env::remove_var("ANTHROPIC_MODEL");
    }
    let from_file = AppConfig::load(Some(&path)).expect("config loads");

    assert_eq!(from_env.model, "claude-from-env");
    assert_eq!(from_file.model, "claude-from-file");
}

#[test]
fn reads_servers_and_tool_arguments() {
    let dir = tempdir().expect("tempdir");
    let content = format!(
        "max_rounds = 8\n\n[workflow]\nconnect_timeout_secs = 5\noutputs_dir = \"out\"\n{}",
        both_servers()
    );
    let path = write_config(dir.path(), &content);
    let config = AppConfig::load(Some(&path)).expect("config loads");

    assert_eq!(config.max_rounds, 8);
    assert_eq!(config.workflow.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.workflow.outputs_dir, PathBuf::from("out"));

    let vault = config.server("obsidian-api-mcp-server").expect("vault server");
    assert_eq!(vault.command, PathBuf::from("uvx"));
    assert_eq!(vault.args.len(), 3);
    assert_eq!(
        vault.env.get("OBSIDIAN_API_URL").map(String::as_str),
        Some("http://127.0.0.1:27123/")
    );
    assert_eq!(
        vault.tool_arguments["search_vault"].get("context_length"),
        Some(&json!(64000))
    );

    let dkg = config.server("originTrail").expect("dkg server");
    assert!(dkg.tool_arguments.is_empty());
    assert!(dkg.workdir.is_none());
}

#[test]
fn vault_context_length_follows_max_tokens_unless_set() {
    let dir = tempdir().expect("tempdir");
    let servers = r#"
[[servers]]
name = "obsidian-api-mcp-server"
command = "uvx"

[[servers]]
name = "originTrail"
command = "python"
"#;
    let path = write_config(dir.path(), &format!("max_tokens = 32000\n{servers}"));
    let config = AppConfig::load(Some(&path)).expect("config loads");
    let vault = config.server("obsidian-api-mcp-server").expect("vault server");
    assert_eq!(
        vault.tool_arguments["search_vault"].get("context_length"),
        Some(&json!(32000))
    );
    let dkg = config.server("originTrail").expect("dkg server");
    assert!(dkg.tool_arguments.is_empty());

    let path = write_config(dir.path(), &format!("max_tokens = 32000\n{}", both_servers()));
    let config = AppConfig::load(Some(&path)).expect("config loads");
    let vault = config.server("obsidian-api-mcp-server").expect("vault server");
    assert_eq!(
        vault.tool_arguments["search_vault"].get("context_length"),
        Some(&json!(64000))
    );
}
