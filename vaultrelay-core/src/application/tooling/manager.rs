use super::error::ToolInvokeError;
use super::interface::{ServerConnector, ToolServer};
use super::process::StdioConnector;
use crate::config::ServerConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Owns the live server connections of one session.
///
/// Connections are made and torn down explicitly; nothing is reconnected
/// behind the caller's back.
pub struct ServerManager {
    configs: HashMap<String, ServerConfig>,
    connector: Arc<dyn ServerConnector>,
    connected: Vec<Arc<dyn ToolServer>>,
    connect_timeout: Duration,
}

impl ServerManager {
    pub fn new(configs: Vec<ServerConfig>, connect_timeout: Duration) -> Self {
        Self::with_connector(configs, connect_timeout, Arc::new(StdioConnector))
    }

    pub fn with_connector(
        configs: Vec<ServerConfig>,
        connect_timeout: Duration,
        connector: Arc<dyn ServerConnector>,
    ) -> Self {
        let configs = configs
            .into_iter()
            .map(|cfg| (cfg.name.clone(), cfg))
            .collect();
        Self {
            configs,
            connector,
            connected: Vec::new(),
            connect_timeout,
        }
    }

    /// Connect the named server unless it is already connected.
    pub async fn connect(&mut self, server: &str) -> Result<(), ToolInvokeError> {
        if self.is_connected(server) {
            return Ok(());
        }
        let config = self
            .configs
            .get(server)
            .ok_or_else(|| ToolInvokeError::NotConfigured {
                server: server.to_string(),
            })?;

        let connection = self.connector.connect(config, self.connect_timeout).await?;
        self.connected.push(connection);
        Ok(())
    }

    /// Connected servers, in connection order.
    pub fn connected(&self) -> &[Arc<dyn ToolServer>] {
        &self.connected
    }

    pub fn is_connected(&self, server: &str) -> bool {
        self.connected.iter().any(|conn| conn.name() == server)
    }

    /// Close every connection. Failures are logged, never raised.
    pub async fn disconnect_all(&mut self) {
        if self.connected.is_empty() {
            return;
        }
        info!(count = self.connected.len(), "Cleaning up connections");
        for connection in self.connected.drain(..) {
            if let Err(err) = connection.close().await {
                warn!(server = connection.name(), %err, "Error cleaning up server");
            }
        }
    }
}
