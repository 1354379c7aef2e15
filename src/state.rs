//! VPN lifecycle state types
//!
//! `ConnectionState` and `ErrorCode` describe what the platform VPN service
//! reports. `StateCode` is what crosses the event channel: a fixed integer
//! table that does not depend on the declaration order of either enum.

use std::fmt;

/// Lifecycle state reported by the platform VPN service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No tunnel
    Disabled,
    /// Tunnel negotiation in progress
    Connecting,
    /// Tunnel established
    Connected,
    /// Tunnel teardown in progress
    Disconnecting,
    /// The service gave up on the tunnel
    Error,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 5] = [
        ConnectionState::Disabled,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Disconnecting,
        ConnectionState::Error,
    ];
}

/// Error sub-code reported alongside the lifecycle state
///
/// Numbering follows the charon error states of the strongSwan Android
/// client, which is also what `getCharonErrorState` returns.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    #[default]
    NoError = 0,
    AuthFailed = 1,
    PeerAuthFailed = 2,
    LookupFailed = 3,
    Unreachable = 4,
    GenericError = 5,
    PasswordMissing = 6,
    CertificateUnavailable = 7,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::NoError,
        ErrorCode::AuthFailed,
        ErrorCode::PeerAuthFailed,
        ErrorCode::LookupFailed,
        ErrorCode::Unreachable,
        ErrorCode::GenericError,
        ErrorCode::PasswordMissing,
        ErrorCode::CertificateUnavailable,
    ];

    pub fn is_error(self) -> bool {
        self != ErrorCode::NoError
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::AuthFailed => "authentication failed",
            ErrorCode::PeerAuthFailed => "peer authentication failed",
            ErrorCode::LookupFailed => "server lookup failed",
            ErrorCode::Unreachable => "server unreachable",
            ErrorCode::GenericError => "generic error",
            ErrorCode::PasswordMissing => "password missing",
            ErrorCode::CertificateUnavailable => "certificate unavailable",
        };
        f.write_str(text)
    }
}

/// Integer code emitted on the state event channel
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateCode {
    Disabled = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
    Error = 4,
}

impl StateCode {
    /// Map a service state to the wire code. Any error sub-code wins over
    /// the lifecycle state.
    pub fn mirror(state: ConnectionState, error: ErrorCode) -> Self {
        if error.is_error() {
            return StateCode::Error;
        }
        match state {
            ConnectionState::Disabled => StateCode::Disabled,
            ConnectionState::Connecting => StateCode::Connecting,
            ConnectionState::Connected => StateCode::Connected,
            ConnectionState::Disconnecting => StateCode::Disconnecting,
            ConnectionState::Error => StateCode::Error,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(StateCode::Disabled),
            1 => Some(StateCode::Connecting),
            2 => Some(StateCode::Connected),
            3 => Some(StateCode::Disconnecting),
            4 => Some(StateCode::Error),
            _ => None,
        }
    }
}

impl From<StateCode> for i32 {
    fn from(code: StateCode) -> i32 {
        code as i32
    }
}
