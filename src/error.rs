//! Error types for vpnbridge

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Argument present but unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Required argument absent from a method call
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    /// VPN protocol variant the platform service does not know
    #[error("Unsupported VPN type: {0}")]
    UnsupportedVpnType(String),
    /// No platform service is bound
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The platform service reported a failed connection attempt
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },
    /// VPN permission not granted
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Operation not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// D-Bus transport error
    #[error("D-Bus error: {0}")]
    Dbus(String),
}

impl BridgeError {
    /// Stable error code reported to the method channel caller
    pub fn channel_code(&self) -> &'static str {
        match self {
            BridgeError::Io(_) => "IO_ERROR",
            BridgeError::InvalidArgument(_) | BridgeError::MissingArgument(_) => "INVALID_ARGUMENT",
            BridgeError::UnsupportedVpnType(_) => "UNSUPPORTED_VPN_TYPE",
            BridgeError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            BridgeError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            BridgeError::PermissionDenied(_) => "PERMISSION_DENIED",
            BridgeError::InvalidState(_) => "INVALID_STATE",
            BridgeError::Config(_) => "CONFIG_ERROR",
            BridgeError::Serialization(_) => "SERIALIZATION_ERROR",
            BridgeError::Dbus(_) => "DBUS_ERROR",
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        BridgeError::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(error: toml::de::Error) -> Self {
        BridgeError::Config(format!("Invalid TOML: {}", error))
    }
}

impl From<zbus::Error> for BridgeError {
    fn from(error: zbus::Error) -> Self {
        BridgeError::Dbus(error.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
