// Close-code mapping across the WebSocket and protocol ranges.
use std::fmt;

/// Close codes observed when the transport drops.
///
/// The 1000–1015 range comes from the WebSocket layer; codes at 3000 and
/// above belong to the application protocol. Codes the client has no name
/// for are preserved in `Unknown`; a close delivered without any code maps
/// to `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    Normal,
    GoingAway,
    ProtocolError,
    UnsupportedData,
    NoStatus,
    Abnormal,
    InvalidFramePayload,
    PolicyViolation,
    MessageTooBig,
    MandatoryExtension,
    InternalError,
    ServiceRestart,
    TryAgainLater,
    BadGateway,
    TlsHandshake,
    Shutdown,
    InvalidToken,
    ForceNoReconnect,
    TokenVerificationFailed,
    Absent,
    Unknown(u16),
}

impl CloseCode {
    pub fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1005 => CloseCode::NoStatus,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::InvalidFramePayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::MandatoryExtension,
            1011 => CloseCode::InternalError,
            1012 => CloseCode::ServiceRestart,
            1013 => CloseCode::TryAgainLater,
            1014 => CloseCode::BadGateway,
            1015 => CloseCode::TlsHandshake,
            3001 => CloseCode::Shutdown,
            3500 => CloseCode::InvalidToken,
            3503 => CloseCode::ForceNoReconnect,
            4333 => CloseCode::TokenVerificationFailed,
            other => CloseCode::Unknown(other),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnsupportedData => 1003,
            CloseCode::NoStatus | CloseCode::Absent => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::InvalidFramePayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::MandatoryExtension => 1010,
            CloseCode::InternalError => 1011,
            CloseCode::ServiceRestart => 1012,
            CloseCode::TryAgainLater => 1013,
            CloseCode::BadGateway => 1014,
            CloseCode::TlsHandshake => 1015,
            CloseCode::Shutdown => 3001,
            CloseCode::InvalidToken => 3500,
            CloseCode::ForceNoReconnect => 3503,
            CloseCode::TokenVerificationFailed => 4333,
            CloseCode::Unknown(code) => *code,
        }
    }

    /// Whether the reconnect policy may schedule another attempt after a
    /// close with this code. Unknown codes are reconnectable.
    pub fn is_reconnectable(&self) -> bool {
        !matches!(
            self,
            CloseCode::UnsupportedData
                | CloseCode::MandatoryExtension
                | CloseCode::InvalidToken
                | CloseCode::ForceNoReconnect
        )
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseCode::Unknown(code) => write!(f, "unknown({code})"),
            CloseCode::Absent => write!(f, "absent"),
            other => write!(f, "{}({})", lower_name(other), other.as_u16()),
        }
    }
}

fn lower_name(code: &CloseCode) -> &'static str {
    match code {
        CloseCode::Normal => "normal",
        CloseCode::GoingAway => "going_away",
        CloseCode::ProtocolError => "protocol_error",
        CloseCode::UnsupportedData => "unsupported_data",
        CloseCode::NoStatus => "no_status",
        CloseCode::Abnormal => "abnormal",
        CloseCode::InvalidFramePayload => "invalid_frame_payload",
        CloseCode::PolicyViolation => "policy_violation",
        CloseCode::MessageTooBig => "message_too_big",
        CloseCode::MandatoryExtension => "mandatory_extension",
        CloseCode::InternalError => "internal_error",
        CloseCode::ServiceRestart => "service_restart",
        CloseCode::TryAgainLater => "try_again_later",
        CloseCode::BadGateway => "bad_gateway",
        CloseCode::TlsHandshake => "tls_handshake",
        CloseCode::Shutdown => "shutdown",
        CloseCode::InvalidToken => "invalid_token",
        CloseCode::ForceNoReconnect => "force_no_reconnect",
        CloseCode::TokenVerificationFailed => "token_verification_failed",
        CloseCode::Absent | CloseCode::Unknown(_) => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        for code in [1000, 1006, 1011, 3001, 3500, 3503, 4333] {
            assert_eq!(CloseCode::from_u16(code).as_u16(), code);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(CloseCode::from_u16(4444), CloseCode::Unknown(4444));
        assert_eq!(CloseCode::Unknown(4444).as_u16(), 4444);
    }

    #[test]
    fn irrecoverable_codes_deny_reconnect() {
        assert!(!CloseCode::UnsupportedData.is_reconnectable());
        assert!(!CloseCode::MandatoryExtension.is_reconnectable());
        assert!(!CloseCode::InvalidToken.is_reconnectable());
        assert!(!CloseCode::ForceNoReconnect.is_reconnectable());
    }

    #[test]
    fn other_codes_allow_reconnect() {
        assert!(CloseCode::Normal.is_reconnectable());
        assert!(CloseCode::Abnormal.is_reconnectable());
        assert!(CloseCode::TokenVerificationFailed.is_reconnectable());
        assert!(CloseCode::Absent.is_reconnectable());
        assert!(CloseCode::Unknown(4444).is_reconnectable());
    }
}
