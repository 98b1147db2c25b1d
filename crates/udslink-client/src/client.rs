//! Diagnostic tester client

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use udslink_codec::{RawResponse, UdsRequest, UdsResponse};

use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle. The handle lives inside the state, so it cannot
/// be used while disconnected.
enum ConnectionState {
    Disconnected,
    Connected(Box<WsStream>),
}

/// A tester client holding at most one bridge connection.
///
/// All transitions go through [`connect`](DiagClient::connect) and
/// [`disconnect`](DiagClient::disconnect); transport errors during send or
/// receive drop the client back to the disconnected state.
pub struct DiagClient {
    state: ConnectionState,
}

impl Default for DiagClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagClient {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Open a WebSocket connection to the bridge (e.g. `ws://host:8080`).
    pub async fn connect(&mut self, url: &str) -> Result<(), ClientError> {
        if self.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }

        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        info!(%url, "Connected to bridge");
        self.state = ConnectionState::Connected(Box::new(ws));
        Ok(())
    }

    /// Close the connection if one is open. Disconnecting while already
    /// disconnected is a no-op.
    pub async fn disconnect(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Connected(mut ws) = state {
            let _ = ws.close(None).await;
            info!("Disconnected from bridge");
        }
    }

    /// Encode and send one request as a single binary message.
    pub async fn send(&mut self, request: &UdsRequest) -> Result<(), ClientError> {
        let bytes = request.encode();
        let ws = match &mut self.state {
            ConnectionState::Connected(ws) => ws,
            ConnectionState::Disconnected => return Err(ClientError::NotConnected),
        };

        debug!(data = %hex::encode(&bytes), "Request");
        if let Err(e) = ws.send(Message::Binary(bytes)).await {
            self.state = ConnectionState::Disconnected;
            return Err(ClientError::Transport(e.to_string()));
        }
        Ok(())
    }

    /// Receive the next response message and classify it.
    ///
    /// Binary and text frames both pass through the codec's normalization
    /// boundary, so a backend replying with a hex dump decodes the same as
    /// one replying with raw bytes. Note the bridge forwards backend
    /// chunks as-is: one logical response may arrive as more than one
    /// message if the backend wrote it in parts.
    pub async fn recv(&mut self) -> Result<UdsResponse, ClientError> {
        loop {
            let ws = match &mut self.state {
                ConnectionState::Connected(ws) => ws,
                ConnectionState::Disconnected => return Err(ClientError::NotConnected),
            };

            match ws.next().await {
                Some(Ok(Message::Binary(data))) => {
                    debug!(data = %hex::encode(&data), "Response");
                    return Ok(UdsResponse::decode(&RawResponse::Binary(data)));
                }
                Some(Ok(Message::Text(text))) => {
                    debug!(data = %text, "Response (text)");
                    return Ok(UdsResponse::decode(&RawResponse::Hex(text)));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | None => {
                    self.state = ConnectionState::Disconnected;
                    return Err(ClientError::Closed);
                }
                Some(Err(e)) => {
                    self.state = ConnectionState::Disconnected;
                    return Err(ClientError::Transport(e.to_string()));
                }
            }
        }
    }

    /// Send a request and wait for the next response.
    pub async fn request(&mut self, request: &UdsRequest) -> Result<UdsResponse, ClientError> {
        self.send(request).await?;
        self.recv().await
    }
}
