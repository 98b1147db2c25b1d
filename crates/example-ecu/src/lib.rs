//! example-ecu - TCP UDS server simulator
//!
//! A minimal diagnostic server for exercising the udslink bridge and
//! client: it answers ReadDataByIdentifier (0x22) and
//! WriteDataByIdentifier (0x2E) from a DID table, and rejects everything
//! else with ServiceNotSupported. One request per received chunk, one
//! response per request, in lockstep.

pub mod did_store;
pub mod server;
pub mod uds;

pub use did_store::{DidStore, StoreError};
pub use server::EcuServer;
