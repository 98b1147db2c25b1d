//! Example ECU Simulator
//!
//! A TCP UDS diagnostic server for exercising udslink. Answers
//! ReadDataByIdentifier and WriteDataByIdentifier from a DID table that
//! can be persisted to a JSON data file.
//!
//! # Usage
//!
//! ```bash
//! ./example-ecu --port 8888 --data-file data/did_data.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use example_ecu::{DidStore, EcuServer};

#[derive(Parser, Debug)]
#[command(name = "example-ecu")]
#[command(about = "Example UDS server simulator for udslink development")]
struct Args {
    /// TCP listen port
    #[arg(short, long, default_value_t = 8888)]
    port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// DID data file (JSON); written back on every DID write.
    /// Omit for a purely in-memory table.
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "example_ecu=debug"
    } else {
        "example_ecu=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    let store = match &args.data_file {
        Some(path) => Arc::new(DidStore::with_file(path)?),
        None => Arc::new(DidStore::new()),
    };
    tracing::info!(dids = store.len(), "DID table ready");

    let addr = format!("{}:{}", args.bind, args.port);
    let server = EcuServer::bind(&addr, store).await?;
    server.run().await;

    Ok(())
}
