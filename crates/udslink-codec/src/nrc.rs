//! UDS Negative Response Codes (NRC)

use std::fmt;

/// UDS Negative Response Codes (NRC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NegativeResponseCode {
    GeneralReject = 0x10,
    ServiceNotSupported = 0x11,
    SubFunctionNotSupported = 0x12,
    IncorrectMessageLengthOrFormat = 0x13,
    ResponseTooLong = 0x14,
    BusyRepeatRequest = 0x21,
    ConditionsNotCorrect = 0x22,
    RequestSequenceError = 0x24,
    RequestOutOfRange = 0x31,
    SecurityAccessDenied = 0x33,
    InvalidKey = 0x35,
    GeneralProgrammingFailure = 0x72,
    ResponsePending = 0x78,
    ServiceNotSupportedInActiveSession = 0x7F,

    /// Unknown/reserved NRC
    Unknown(u8),
}

impl From<u8> for NegativeResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0x10 => Self::GeneralReject,
            0x11 => Self::ServiceNotSupported,
            0x12 => Self::SubFunctionNotSupported,
            0x13 => Self::IncorrectMessageLengthOrFormat,
            0x14 => Self::ResponseTooLong,
            0x21 => Self::BusyRepeatRequest,
            0x22 => Self::ConditionsNotCorrect,
            0x24 => Self::RequestSequenceError,
            0x31 => Self::RequestOutOfRange,
            0x33 => Self::SecurityAccessDenied,
            0x35 => Self::InvalidKey,
            0x72 => Self::GeneralProgrammingFailure,
            0x78 => Self::ResponsePending,
            0x7F => Self::ServiceNotSupportedInActiveSession,
            other => Self::Unknown(other),
        }
    }
}

impl From<NegativeResponseCode> for u8 {
    fn from(nrc: NegativeResponseCode) -> Self {
        match nrc {
            NegativeResponseCode::GeneralReject => 0x10,
            NegativeResponseCode::ServiceNotSupported => 0x11,
            NegativeResponseCode::SubFunctionNotSupported => 0x12,
            NegativeResponseCode::IncorrectMessageLengthOrFormat => 0x13,
            NegativeResponseCode::ResponseTooLong => 0x14,
            NegativeResponseCode::BusyRepeatRequest => 0x21,
            NegativeResponseCode::ConditionsNotCorrect => 0x22,
            NegativeResponseCode::RequestSequenceError => 0x24,
            NegativeResponseCode::RequestOutOfRange => 0x31,
            NegativeResponseCode::SecurityAccessDenied => 0x33,
            NegativeResponseCode::InvalidKey => 0x35,
            NegativeResponseCode::GeneralProgrammingFailure => 0x72,
            NegativeResponseCode::ResponsePending => 0x78,
            NegativeResponseCode::ServiceNotSupportedInActiveSession => 0x7F,
            NegativeResponseCode::Unknown(v) => v,
        }
    }
}

impl fmt::UpperHex for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: u8 = (*self).into();
        fmt::UpperHex::fmt(&value, f)
    }
}

impl fmt::Display for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneralReject => write!(f, "GeneralReject"),
            Self::ServiceNotSupported => write!(f, "ServiceNotSupported"),
            Self::SubFunctionNotSupported => write!(f, "SubFunctionNotSupported"),
            Self::IncorrectMessageLengthOrFormat => write!(f, "IncorrectMessageLengthOrFormat"),
            Self::ResponseTooLong => write!(f, "ResponseTooLong"),
            Self::BusyRepeatRequest => write!(f, "BusyRepeatRequest"),
            Self::ConditionsNotCorrect => write!(f, "ConditionsNotCorrect"),
            Self::RequestSequenceError => write!(f, "RequestSequenceError"),
            Self::RequestOutOfRange => write!(f, "RequestOutOfRange"),
            Self::SecurityAccessDenied => write!(f, "SecurityAccessDenied"),
            Self::InvalidKey => write!(f, "InvalidKey"),
            Self::GeneralProgrammingFailure => write!(f, "GeneralProgrammingFailure"),
            Self::ResponsePending => write!(f, "ResponsePending"),
            Self::ServiceNotSupportedInActiveSession => {
                write!(f, "ServiceNotSupportedInActiveSession")
            }
            Self::Unknown(v) => write!(f, "Unknown(0x{:02X})", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_nrc_round_trip() {
        for value in [0x10u8, 0x11, 0x13, 0x22, 0x31, 0x33, 0x72, 0x78] {
            let nrc = NegativeResponseCode::from(value);
            assert_eq!(u8::from(nrc), value);
        }
    }

    #[test]
    fn test_unknown_nrc_preserves_value() {
        let nrc = NegativeResponseCode::from(0x99);
        assert_eq!(nrc, NegativeResponseCode::Unknown(0x99));
        assert_eq!(u8::from(nrc), 0x99);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(
            NegativeResponseCode::ServiceNotSupported.to_string(),
            "ServiceNotSupported"
        );
        assert_eq!(
            NegativeResponseCode::Unknown(0xAB).to_string(),
            "Unknown(0xAB)"
        );
    }
}
