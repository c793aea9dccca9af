mod cli;

use clap::Parser;
use cli::{Cli, RunMode};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;
use vaultrelay_core::AppConfig;
use vaultrelay_core::conversation::ConversationError;
use vaultrelay_core::interaction::ConsoleInteraction;
use vaultrelay_core::model::AnthropicClient;
use vaultrelay_core::orchestrator::{SessionError, SessionOrchestrator, SessionOutcome};
use vaultrelay_core::tooling::{ServerManager, ToolServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    debug!(mode = ?cli.mode, config = ?cli.config, session = ?cli.session, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration from default path");
    }

    match cli.mode {
        RunMode::Sequence => run_sequence(&cli, &config).await?,
        RunMode::Tools => list_tools(&cli, &config).await?,
    }
    info!("Client execution finished");
    Ok(())
}

async fn run_sequence(cli: &Cli, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let session_id = cli
        .session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(session = %session_id, model = %config.model, "Starting MCP sequential client");

    let provider = Arc::new(AnthropicClient::from_config(&config.provider));
    let interaction = Arc::new(ConsoleInteraction::new());
    let mut orchestrator = SessionOrchestrator::new(config, provider, interaction);

    match orchestrator.run(&session_id).await {
        Ok(SessionOutcome::Submitted { path, .. }) => {
            info!(path = %path.display(), "Sequence submitted");
            Ok(())
        }
        Ok(SessionOutcome::Declined) => {
            info!("Sequence declined by user");
            Ok(())
        }
        Err(SessionError::Conversation(ConversationError::Model(err))) => {
            eprintln!("{}", err.user_message());
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

async fn list_tools(cli: &Cli, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let names: Vec<String> = match &cli.server {
        Some(name) => vec![name.clone()],
        None => config.servers.iter().map(|server| server.name.clone()).collect(),
    };

    let mut manager = ServerManager::new(config.servers.clone(), config.workflow.connect_timeout);
    for name in names {
        if let Err(err) = manager.connect(&name).await {
            warn!(server = %name, %err, "Could not connect");
            eprintln!("{name}: {err}");
            continue;
        }
        for server in manager.connected() {
            print_catalog(server.as_ref()).await;
        }
        manager.disconnect_all().await;
    }
    Ok(())
}

async fn print_catalog(server: &dyn ToolServer) {
    match server.list_tools().await {
        Ok(tools) => {
            println!("{} ({} tools)", server.name(), tools.len());
            for tool in tools {
                match tool.description {
                    Some(description) => println!("  - {}: {}", tool.name, description),
                    None => println!("  - {}", tool.name),
                }
            }
        }
        Err(err) => eprintln!("{}: {err}", server.name()),
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
