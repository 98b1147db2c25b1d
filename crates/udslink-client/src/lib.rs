//! udslink-client - diagnostic tester client
//!
//! Connects to a udslink bridge over WebSocket, sends encoded UDS requests,
//! and decodes the responses. The connection is an explicit state held by
//! [`DiagClient`] (no shared or global connection handle) and it
//! transitions only through `connect`/`disconnect`.

mod client;
mod error;

pub use client::DiagClient;
pub use error::ClientError;
