//! strongSwan (charon) state values on Android
//!
//! The strongSwan `VpnStateService` reports a `State` and an `ErrorState`
//! enum. The JNI layer passes their ordinals; these types decode them.

use crate::state::{ConnectionState, ErrorCode};

/// `VpnStateService.State`
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharonState {
    Disabled = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
}

impl CharonState {
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(CharonState::Disabled),
            1 => Some(CharonState::Connecting),
            2 => Some(CharonState::Connected),
            3 => Some(CharonState::Disconnecting),
            _ => None,
        }
    }
}

impl From<CharonState> for ConnectionState {
    fn from(state: CharonState) -> Self {
        match state {
            CharonState::Disabled => ConnectionState::Disabled,
            CharonState::Connecting => ConnectionState::Connecting,
            CharonState::Connected => ConnectionState::Connected,
            CharonState::Disconnecting => ConnectionState::Disconnecting,
        }
    }
}

/// `VpnStateService.ErrorState`
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharonErrorState {
    NoError = 0,
    AuthFailed = 1,
    PeerAuthFailed = 2,
    LookupFailed = 3,
    Unreachable = 4,
    GenericError = 5,
    PasswordMissing = 6,
    CertificateUnavailable = 7,
}

impl CharonErrorState {
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        ErrorCode::from_code(ordinal).map(|code| match code {
            ErrorCode::NoError => CharonErrorState::NoError,
            ErrorCode::AuthFailed => CharonErrorState::AuthFailed,
            ErrorCode::PeerAuthFailed => CharonErrorState::PeerAuthFailed,
            ErrorCode::LookupFailed => CharonErrorState::LookupFailed,
            ErrorCode::Unreachable => CharonErrorState::Unreachable,
            ErrorCode::GenericError => CharonErrorState::GenericError,
            ErrorCode::PasswordMissing => CharonErrorState::PasswordMissing,
            ErrorCode::CertificateUnavailable => CharonErrorState::CertificateUnavailable,
        })
    }
}

impl From<CharonErrorState> for ErrorCode {
    fn from(error: CharonErrorState) -> Self {
        match error {
            CharonErrorState::NoError => ErrorCode::NoError,
            CharonErrorState::AuthFailed => ErrorCode::AuthFailed,
            CharonErrorState::PeerAuthFailed => ErrorCode::PeerAuthFailed,
            CharonErrorState::LookupFailed => ErrorCode::LookupFailed,
            CharonErrorState::Unreachable => ErrorCode::Unreachable,
            CharonErrorState::GenericError => ErrorCode::GenericError,
            CharonErrorState::PasswordMissing => ErrorCode::PasswordMissing,
            CharonErrorState::CertificateUnavailable => ErrorCode::CertificateUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateCode;

    #[test]
    fn test_state_ordinals() {
        for ordinal in 0..4 {
            let state = CharonState::from_ordinal(ordinal).unwrap();
            assert_eq!(state as i32, ordinal);
            // Charon ordinals line up with the wire codes when there is no error
            let code = StateCode::mirror(state.into(), ErrorCode::NoError);
            assert_eq!(code.code(), ordinal);
        }
        assert_eq!(CharonState::from_ordinal(4), None);
    }

    #[test]
    fn test_error_ordinals() {
        for ordinal in 0..8 {
            let error = CharonErrorState::from_ordinal(ordinal).unwrap();
            assert_eq!(error as i32, ordinal);
            assert_eq!(ErrorCode::from(error).code(), ordinal);
        }
        assert_eq!(CharonErrorState::from_ordinal(8), None);
        assert_eq!(CharonErrorState::from_ordinal(-1), None);
    }
}
