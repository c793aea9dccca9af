pub mod app;
pub mod error;
pub mod loader;
pub mod provider;
pub mod server;
pub mod workflow;

pub use app::AppConfig;
pub use error::ConfigError;
pub use provider::ProviderConfig;
pub use server::ServerConfig;
pub use workflow::WorkflowConfig;
