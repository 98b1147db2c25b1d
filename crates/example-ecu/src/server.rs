//! TCP server loop for the ECU simulator

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::did_store::DidStore;
use crate::uds;

/// Matches the reference server's receive buffer; UDS frames here are far
/// smaller than this.
const BUFFER_SIZE: usize = 1024;

/// TCP-facing UDS responder. Each connected tester gets its own task;
/// within a connection, requests are answered in lockstep.
pub struct EcuServer {
    listener: TcpListener,
    store: Arc<DidStore>,
}

impl EcuServer {
    pub async fn bind(addr: &str, store: Arc<DidStore>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "UDS server listening");
        Ok(Self { listener, store })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "Tester connected");
                    tokio::spawn(serve_tester(stream, peer, Arc::clone(&self.store)));
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                }
            }
        }
    }
}

async fn serve_tester(mut stream: TcpStream, peer: SocketAddr, store: Arc<DidStore>) {
    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                info!(%peer, "Tester disconnected");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                warn!(%peer, error = %e, "Receive failed");
                break;
            }
        };

        let request = &buf[..n];
        debug!(%peer, data = %hex::encode(request), "Request");

        let response = uds::handle_request(&store, request);
        debug!(%peer, data = %hex::encode(&response), "Response");

        if let Err(e) = stream.write_all(&response).await {
            warn!(%peer, error = %e, "Send failed");
            break;
        }
    }
}
