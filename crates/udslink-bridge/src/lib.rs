//! udslink-bridge - WebSocket to TCP relay for UDS diagnostic traffic
//!
//! The bridge accepts message-oriented WebSocket connections and pairs each
//! one with a byte-stream TCP connection to a fixed backend (typically a
//! UDS diagnostic server). Bytes are relayed verbatim in both directions:
//! every inbound WebSocket message is written to the backend stream, and
//! every readable backend chunk is forwarded as one WebSocket message.
//!
//! The bridge carries the payload opaquely; it has no dependency on the
//! diagnostic codec. The only process-wide state is the set of live
//! sessions, which grows on accept and shrinks on teardown.
//!
//! ```text
//! ┌──────────┐  WebSocket   ┌────────────────────┐   TCP    ┌─────────┐
//! │  tester  │ ──────────── │       Bridge       │ ──────── │ backend │
//! │  client  │   messages   │  one session per   │  bytes   │  (UDS)  │
//! └──────────┘              │  inbound conn      │          └─────────┘
//!                           └────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod server;
mod session;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use registry::{SessionInfo, SessionRegistry};
pub use server::Bridge;
