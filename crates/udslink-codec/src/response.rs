//! UDS response classification

use crate::normalize::RawResponse;
use crate::nrc::NegativeResponseCode;
use crate::service_id;

/// Positive responses echo the request service ID offset by 0x40; 0x7F is
/// reserved for the negative-response marker, so 0x7E is the highest first
/// byte a positive response can carry.
const POSITIVE_OFFSET: u8 = 0x40;
const POSITIVE_MAX: u8 = 0x7E;

/// A classified UDS response.
///
/// Produced only by decoding; callers never construct one directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UdsResponse {
    /// Positive response; `service` is the request service ID recovered
    /// from the echoed first byte.
    Positive { service: u8 },
    /// Negative response with the rejected service ID and its NRC.
    Negative {
        service: u8,
        nrc: NegativeResponseCode,
    },
    /// The bytes match no known response pattern. `raw` retains the input
    /// for diagnostics.
    Malformed { raw: Vec<u8> },
}

impl UdsResponse {
    /// Classify a canonical byte sequence.
    ///
    /// Total over any input length: never panics, always returns exactly
    /// one of the three variants. Bytes after the negative-response triple
    /// or the positive first byte are ignored (the backend may append
    /// echoed DID bytes and data).
    pub fn classify(bytes: &[u8]) -> Self {
        if bytes.len() < 2 {
            return Self::Malformed {
                raw: bytes.to_vec(),
            };
        }

        if bytes[0] == service_id::NEGATIVE_RESPONSE {
            if bytes.len() < 3 {
                return Self::Malformed {
                    raw: bytes.to_vec(),
                };
            }
            return Self::Negative {
                service: bytes[1],
                nrc: NegativeResponseCode::from(bytes[2]),
            };
        }

        if (POSITIVE_OFFSET..=POSITIVE_MAX).contains(&bytes[0]) {
            return Self::Positive {
                service: bytes[0] - POSITIVE_OFFSET,
            };
        }

        Self::Malformed {
            raw: bytes.to_vec(),
        }
    }

    /// Normalize a transport-shaped payload and classify it.
    ///
    /// A normalization failure is itself a decode failure and resolves to
    /// `Malformed`, never to a propagated error.
    pub fn decode(raw: &RawResponse) -> Self {
        match raw.normalize() {
            Ok(bytes) => Self::classify(&bytes),
            Err(_) => Self::Malformed {
                raw: raw.lossy_bytes(),
            },
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Positive { .. })
    }
}
