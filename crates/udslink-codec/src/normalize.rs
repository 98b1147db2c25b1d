//! Response payload normalization
//!
//! The transport layer can hand a response back in several shapes: a
//! contiguous binary buffer, a sequence of integers, or a textual hex dump
//! with whitespace between byte pairs. Everything is converted to one
//! canonical byte sequence here, before classification runs, so the
//! decoder only ever sees bytes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Hex dump has an odd number of digits ({0})")]
    OddHexLength(usize),

    #[error("Invalid hex dump: {0}")]
    InvalidHex(String),

    #[error("Value out of byte range at index {index}: {value}")]
    ValueOutOfRange { index: usize, value: i64 },
}

/// A response payload as delivered by the transport, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    /// Contiguous binary buffer (already canonical)
    Binary(Vec<u8>),
    /// Sequence of integer byte values, each expected in 0..=255
    Values(Vec<i64>),
    /// Hex dump, optionally whitespace-separated (e.g. "62 F1 90")
    Hex(String),
}

impl RawResponse {
    /// Convert to the canonical byte sequence.
    ///
    /// Never fails silently: an odd number of hex digits, a non-hex
    /// character, or an integer outside 0..=255 is reported as an error
    /// (which the decoder surfaces as a malformed response).
    pub fn normalize(&self) -> Result<Vec<u8>, NormalizeError> {
        match self {
            Self::Binary(bytes) => Ok(bytes.clone()),
            Self::Values(values) => values
                .iter()
                .enumerate()
                .map(|(index, &value)| {
                    u8::try_from(value)
                        .map_err(|_| NormalizeError::ValueOutOfRange { index, value })
                })
                .collect(),
            Self::Hex(text) => {
                let compact: String = text
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                if compact.len() % 2 != 0 {
                    return Err(NormalizeError::OddHexLength(compact.len()));
                }
                hex::decode(&compact).map_err(|e| NormalizeError::InvalidHex(e.to_string()))
            }
        }
    }

    /// Best-effort byte rendering for malformed-response diagnostics when
    /// normalization itself failed: binary buffers are kept verbatim, hex
    /// text keeps its text bytes, integer sequences keep the in-range
    /// prefix.
    pub(crate) fn lossy_bytes(&self) -> Vec<u8> {
        match self {
            Self::Binary(bytes) => bytes.clone(),
            Self::Values(values) => values
                .iter()
                .map_while(|&v| u8::try_from(v).ok())
                .collect(),
            Self::Hex(text) => text.as_bytes().to_vec(),
        }
    }
}
