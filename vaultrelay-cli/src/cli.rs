use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "vaultrelay",
    version,
    about = "Queries a vault through MCP, confirms the drafted JSON and submits it"
)]
pub struct Cli {
    /// Path to client.toml
    #[arg(long)]
    pub config: Option<String>,
    /// Session identifier used for the output directory
    #[arg(long)]
    pub session: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Sequence)]
    pub mode: RunMode,
    /// Only list tools of this server (tools mode)
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Vault query, confirmation and submission
    Sequence,
    /// Print the tool catalog of each configured server
    Tools,
}
