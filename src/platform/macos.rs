//! NetworkExtension state values on macOS
//!
//! `NEVPNConnection.status` is an `NEVPNStatus`. Failures come back as
//! `NEVPNError` (configuration problems) or, on newer systems, as
//! `NEVPNConnectionError` from `fetchLastDisconnectError`. The Objective-C
//! layer passes the raw integers.

use crate::state::{ConnectionState, ErrorCode};

/// `NEVPNStatus`
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeVpnStatus {
    Invalid = 0,
    Disconnected = 1,
    Connecting = 2,
    Connected = 3,
    Reasserting = 4,
    Disconnecting = 5,
}

impl NeVpnStatus {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(NeVpnStatus::Invalid),
            1 => Some(NeVpnStatus::Disconnected),
            2 => Some(NeVpnStatus::Connecting),
            3 => Some(NeVpnStatus::Connected),
            4 => Some(NeVpnStatus::Reasserting),
            5 => Some(NeVpnStatus::Disconnecting),
            _ => None,
        }
    }
}

impl From<NeVpnStatus> for ConnectionState {
    fn from(status: NeVpnStatus) -> Self {
        match status {
            // No saved configuration counts as no tunnel
            NeVpnStatus::Invalid | NeVpnStatus::Disconnected => ConnectionState::Disabled,
            // Reasserting is a reconnect after a network change
            NeVpnStatus::Connecting | NeVpnStatus::Reasserting => ConnectionState::Connecting,
            NeVpnStatus::Connected => ConnectionState::Connected,
            NeVpnStatus::Disconnecting => ConnectionState::Disconnecting,
        }
    }
}

/// Last failure reported by NetworkExtension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeVpnError {
    #[default]
    None,
    /// `NEVPNError`, domain `NEVPNErrorDomain`
    Configuration(i32),
    /// `NEVPNConnectionError`, domain `NEVPNConnectionErrorDomain`
    Connection(i32),
}

impl From<NeVpnError> for ErrorCode {
    fn from(error: NeVpnError) -> Self {
        match error {
            NeVpnError::None => ErrorCode::NoError,
            NeVpnError::Configuration(_) => ErrorCode::GenericError,
            NeVpnError::Connection(code) => match code {
                // overslept, noNetworkAvailable, unrecoverableNetworkChange
                1..=3 => ErrorCode::Unreachable,
                // serverAddressResolutionFailed
                5 => ErrorCode::LookupFailed,
                // serverNotResponding, serverDead
                6 | 7 => ErrorCode::Unreachable,
                // authenticationFailed
                8 => ErrorCode::AuthFailed,
                // clientCertificateInvalid, clientCertificateNotYetValid, clientCertificateExpired
                9..=11 => ErrorCode::CertificateUnavailable,
                // serverCertificateInvalid, serverCertificateNotYetValid, serverCertificateExpired
                17..=19 => ErrorCode::PeerAuthFailed,
                _ => ErrorCode::GenericError,
            },
        }
    }
}
