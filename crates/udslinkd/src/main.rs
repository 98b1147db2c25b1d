//! udslinkd - UDS WebSocket bridge daemon
//!
//! Relays binary WebSocket messages from diagnostic tester clients to a
//! TCP UDS server and backend bytes back to the clients.
//!
//! Usage:
//!   udslinkd [OPTIONS] [config.toml]
//!
//! Options:
//!   -l, --listen <addr>   WebSocket listen address (default 0.0.0.0:8080)
//!   -b, --backend <addr>  TCP backend address (default 127.0.0.1:8888)
//!
//! Command-line addresses override the config file.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use udslink_bridge::{Bridge, BridgeConfig};

/// Parsed command-line arguments
struct Args {
    /// Bridge config file (TOML)
    config_path: Option<String>,
    /// Listen address override
    listen: Option<String>,
    /// Backend address override
    backend: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: None,
        listen: None,
        backend: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--listen" | "-l" => {
                if i + 1 < args.len() {
                    result.listen = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --listen");
                    i += 1;
                }
            }
            "--backend" | "-b" => {
                if i + 1 < args.len() {
                    result.backend = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --backend");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"udslinkd - UDS WebSocket bridge daemon

Usage: udslinkd [OPTIONS] [config.toml]

Options:
  -l, --listen <addr>   WebSocket listen address (default 0.0.0.0:8080)
  -b, --backend <addr>  TCP backend address (default 127.0.0.1:8888)
  -h, --help            Print this help message

Examples:
  # Run with defaults
  udslinkd

  # Run with config file
  udslinkd bridge.toml

  # Override the backend
  udslinkd --backend 192.168.1.20:8888
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "udslinkd=info,udslink_bridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting udslinkd (UDS WebSocket bridge daemon)");

    let args = parse_args();

    let mut config = if let Some(ref path) = args.config_path {
        tracing::info!("Loading config from: {}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        BridgeConfig::from_toml(&content)?
    } else {
        tracing::info!("No config file provided, using default addresses");
        BridgeConfig::default()
    };

    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(backend) = args.backend {
        config.backend_addr = backend;
    }

    // Bind failure is fatal; everything after this point is session-local.
    let bridge = Bridge::bind(&config).await?;
    bridge.run().await;

    Ok(())
}
