//! UDS request construction

use crate::service_id;

/// A generic UDS request envelope: one service ID byte, a 16-bit data
/// identifier transmitted big-endian, and a service-specific payload.
///
/// Whether a payload is required is the caller's policy (write-type
/// services supply one, read-type services do not); the envelope itself
/// places no restriction on payload length or content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdsRequest {
    /// Service ID (e.g. 0x22 ReadDataByIdentifier)
    pub service: u8,
    /// Data identifier
    pub did: u16,
    /// Service-specific data, may be empty
    pub payload: Vec<u8>,
}

impl UdsRequest {
    pub fn new(service: u8, did: u16, payload: Vec<u8>) -> Self {
        Self {
            service,
            did,
            payload,
        }
    }

    /// ReadDataByIdentifier (0x22) request for a single DID
    pub fn read_data_by_id(did: u16) -> Self {
        Self::new(service_id::READ_DATA_BY_ID, did, Vec::new())
    }

    /// WriteDataByIdentifier (0x2E) request
    pub fn write_data_by_id(did: u16, data: Vec<u8>) -> Self {
        Self::new(service_id::WRITE_DATA_BY_ID, did, data)
    }

    /// Encode as `[service, did_hi, did_lo, payload...]`.
    ///
    /// Deterministic: the same request always encodes to the same bytes,
    /// 3 + payload length in total.
    pub fn encode(&self) -> Vec<u8> {
        let mut request = Vec::with_capacity(3 + self.payload.len());
        request.push(self.service);
        request.extend_from_slice(&self.did.to_be_bytes());
        request.extend_from_slice(&self.payload);
        request
    }
}
