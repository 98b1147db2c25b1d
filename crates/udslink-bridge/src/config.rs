//! Bridge configuration

use serde::Deserialize;

use crate::error::BridgeError;

/// Configuration for the bridge: where to listen for WebSocket clients and
/// which TCP backend to connect each session to.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// WebSocket listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// TCP backend address, connected once per session
    #[serde(default = "default_backend_addr")]
    pub backend_addr: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_backend_addr() -> String {
    "127.0.0.1:8888".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            backend_addr: default_backend_addr(),
        }
    }
}

/// Top-level config file shape: a `[bridge]` table.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    bridge: Option<BridgeConfig>,
}

impl BridgeConfig {
    /// Parse a TOML config file. A missing `[bridge]` table yields the
    /// defaults; unknown keys elsewhere in the file are ignored.
    pub fn from_toml(content: &str) -> Result<Self, BridgeError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        Ok(file.bridge.unwrap_or_default())
    }
}
