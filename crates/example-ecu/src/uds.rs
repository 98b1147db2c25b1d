//! UDS protocol handling for the simulator

use crate::did_store::DidStore;

/// UDS service IDs this simulator understands
pub mod service_id {
    pub const READ_DATA_BY_ID: u8 = 0x22;
    pub const WRITE_DATA_BY_ID: u8 = 0x2E;
    pub const NEGATIVE_RESPONSE: u8 = 0x7F;
}

/// UDS Negative Response Codes
pub mod nrc {
    pub const SERVICE_NOT_SUPPORTED: u8 = 0x11;
    pub const INCORRECT_MESSAGE_LENGTH: u8 = 0x13;
    pub const REQUEST_OUT_OF_RANGE: u8 = 0x31;
    pub const GENERAL_PROGRAMMING_FAILURE: u8 = 0x72;
}

/// Create a positive response for a service
pub fn positive_response(service_id: u8, data: &[u8]) -> Vec<u8> {
    let mut response = Vec::with_capacity(1 + data.len());
    response.push(service_id + 0x40); // Positive response = service + 0x40
    response.extend_from_slice(data);
    response
}

/// Create a negative response
pub fn negative_response(service_id: u8, nrc: u8) -> Vec<u8> {
    vec![service_id::NEGATIVE_RESPONSE, service_id, nrc]
}

/// Process one request frame `[service, did_hi, did_lo, data...]` against
/// the DID store and produce the response frame.
pub fn handle_request(store: &DidStore, request: &[u8]) -> Vec<u8> {
    let Some(&service) = request.first() else {
        return negative_response(0x00, nrc::INCORRECT_MESSAGE_LENGTH);
    };

    if request.len() < 3 {
        return negative_response(service, nrc::INCORRECT_MESSAGE_LENGTH);
    }

    let did = u16::from_be_bytes([request[1], request[2]]);

    match service {
        service_id::READ_DATA_BY_ID => match store.read(did) {
            Some(value) => {
                let mut data = did.to_be_bytes().to_vec();
                data.extend_from_slice(&value);
                positive_response(service, &data)
            }
            None => negative_response(service, nrc::REQUEST_OUT_OF_RANGE),
        },
        service_id::WRITE_DATA_BY_ID => {
            let value = request[3..].to_vec();
            match store.write(did, value) {
                // Echo DID and written data, like the reference server
                Ok(()) => positive_response(service, &request[1..]),
                Err(e) => {
                    tracing::error!(did = format!("{:04X}", did), error = %e, "DID write failed");
                    negative_response(service, nrc::GENERAL_PROGRAMMING_FAILURE)
                }
            }
        }
        _ => negative_response(service, nrc::SERVICE_NOT_SUPPORTED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_known_did() {
        let store = DidStore::new();
        let response = handle_request(&store, &[0x22, 0x12, 0x34]);
        assert_eq!(response, vec![0x62, 0x12, 0x34, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_read_unknown_did() {
        let store = DidStore::new();
        let response = handle_request(&store, &[0x22, 0xBE, 0xEF]);
        assert_eq!(response, vec![0x7F, 0x22, nrc::REQUEST_OUT_OF_RANGE]);
    }

    #[test]
    fn test_write_echoes_did_and_data() {
        let store = DidStore::new();
        let response = handle_request(&store, &[0x2E, 0x01, 0x05, 0x0A, 0x0B]);
        assert_eq!(response, vec![0x6E, 0x01, 0x05, 0x0A, 0x0B]);
        assert_eq!(store.read(0x0105), Some(vec![0x0A, 0x0B]));
    }

    #[test]
    fn test_unsupported_service() {
        let store = DidStore::new();
        let response = handle_request(&store, &[0x10, 0x00, 0x01]);
        assert_eq!(response, vec![0x7F, 0x10, nrc::SERVICE_NOT_SUPPORTED]);
    }

    #[test]
    fn test_short_request() {
        let store = DidStore::new();
        let response = handle_request(&store, &[0x22, 0x12]);
        assert_eq!(response, vec![0x7F, 0x22, nrc::INCORRECT_MESSAGE_LENGTH]);
    }

    #[test]
    fn test_empty_request() {
        let store = DidStore::new();
        let response = handle_request(&store, &[]);
        assert_eq!(response, vec![0x7F, 0x00, nrc::INCORRECT_MESSAGE_LENGTH]);
    }
}
