//! Per-session relay
//!
//! One session owns exactly one WebSocket connection and one TCP backend
//! connection. The two relay directions run as independent tasks so that
//! neither side can stall the other; a shared watch channel is the
//! teardown signal. Whichever direction ends first (close, error, EOF)
//! raises the signal, the peer direction drains out, and the session is
//! removed from the registry.
//!
//! There is no timeout: a backend that never responds and never closes
//! leaves the session open until one of the handles closes.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::{SessionInfo, SessionRegistry};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

const READ_BUFFER_CAPACITY: usize = 4096;

/// Serve one accepted inbound connection: perform the WebSocket handshake,
/// connect the backend, and relay until either side goes away.
///
/// Every failure in here is session-local; the caller's accept loop is
/// never affected.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    backend_addr: String,
    registry: SessionRegistry,
) {
    let mut ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let backend = match TcpStream::connect(&backend_addr).await {
        Ok(backend) => backend,
        Err(e) => {
            warn!(%peer, backend = %backend_addr, error = %e, "Backend connect failed, closing client");
            let _ = ws.close(None).await;
            return;
        }
    };

    let id = Uuid::new_v4();
    registry.insert(
        id,
        SessionInfo {
            peer,
            backend: backend_addr.clone(),
        },
    );
    info!(session = %id, %peer, backend = %backend_addr, "Session established");

    let (ws_sink, ws_stream) = ws.split();
    let (tcp_read, tcp_write) = backend.into_split();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let inbound = tokio::spawn(relay_client_to_backend(
        ws_stream,
        tcp_write,
        Arc::clone(&shutdown_tx),
        shutdown_rx.clone(),
        id,
    ));
    let outbound = tokio::spawn(relay_backend_to_client(
        tcp_read,
        ws_sink,
        shutdown_tx,
        shutdown_rx,
        id,
    ));

    let _ = inbound.await;
    let _ = outbound.await;

    registry.remove(&id);
    info!(session = %id, "Session closed");
}

/// Inbound direction: each complete WebSocket message is written verbatim
/// to the backend stream, in arrival order. Message boundaries are not
/// carried onward; the backend side is an unframed byte stream.
async fn relay_client_to_backend(
    mut ws_stream: WsStream,
    mut tcp_write: OwnedWriteHalf,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
    id: Uuid,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            msg = ws_stream.next() => {
                let bytes = match msg {
                    Some(Ok(Message::Binary(data))) => data,
                    // Text frames are relayed as their UTF-8 bytes
                    Some(Ok(Message::Text(text))) => text.into_bytes(),
                    // Ping/pong is answered inside the WebSocket layer
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) => {
                        debug!(session = %id, "Client sent close");
                        break;
                    }
                    Some(Ok(Message::Frame(_))) => continue,
                    Some(Err(e)) => {
                        warn!(session = %id, error = %e, "WebSocket read failed");
                        break;
                    }
                    None => break,
                };

                debug!(session = %id, data = %hex::encode(&bytes), "Client -> backend");
                if let Err(e) = tcp_write.write_all(&bytes).await {
                    warn!(session = %id, error = %e, "Backend write failed");
                    break;
                }
            }
        }
    }

    let _ = shutdown.send(true);
    let _ = tcp_write.shutdown().await;
}

/// Outbound direction: each readable backend chunk, whatever its size,
/// becomes exactly one WebSocket message. The backend declares no framing,
/// so none is reconstructed; a response written in several low-level
/// chunks arrives at the client as several messages.
async fn relay_backend_to_client(
    mut tcp_read: OwnedReadHalf,
    mut ws_sink: WsSink,
    shutdown: Arc<watch::Sender<bool>>,
    mut shutdown_rx: watch::Receiver<bool>,
    id: Uuid,
) {
    let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            result = tcp_read.read_buf(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!(session = %id, "Backend closed connection");
                        break;
                    }
                    Ok(_) => {
                        let chunk = buf.split();
                        debug!(session = %id, data = %hex::encode(&chunk), "Backend -> client");
                        if let Err(e) = ws_sink.send(Message::Binary(chunk.to_vec())).await {
                            warn!(session = %id, error = %e, "WebSocket send failed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session = %id, error = %e, "Backend read failed");
                        break;
                    }
                }
            }
        }
    }

    let _ = shutdown.send(true);
    let _ = ws_sink.close().await;
}
