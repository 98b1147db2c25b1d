//! Bridge listener and accept loop

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::registry::SessionRegistry;
use crate::session;

/// The running bridge: a bound WebSocket listener plus the backend address
/// every session connects to.
pub struct Bridge {
    listener: TcpListener,
    backend_addr: String,
    registry: SessionRegistry,
}

impl Bridge {
    /// Bind the listen address. This is the only fail-fast operation: a
    /// bridge that cannot listen cannot run. All later connection-level
    /// failures are session-local.
    pub async fn bind(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .map_err(|e| BridgeError::Bind {
                addr: config.listen_addr.clone(),
                source: e,
            })?;

        info!(
            listen = %listener.local_addr()?,
            backend = %config.backend_addr,
            "Bridge listening"
        );

        Ok(Self {
            listener,
            backend_addr: config.backend_addr.clone(),
            registry: SessionRegistry::new(),
        })
    }

    /// Actual bound address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle on the live-session registry.
    pub fn registry(&self) -> SessionRegistry {
        self.registry.clone()
    }

    /// Accept connections forever. Each accepted socket is served on its
    /// own task; accept errors are logged and never tear down sessions
    /// that are already relaying.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "Inbound connection");
                    tokio::spawn(session::serve_connection(
                        stream,
                        peer,
                        self.backend_addr.clone(),
                        self.registry.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                }
            }
        }
    }
}
