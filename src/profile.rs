//! Connection profile passed to the platform service on `connect`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::channel::Arguments;
use crate::error::{BridgeError, BridgeResult};

/// Protocol variant of a connection profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VpnType {
    /// IKEv2 with EAP username/password
    #[default]
    #[serde(rename = "IKEv2")]
    IkeV2,
    /// IKEv1 (Cisco IPSec) with pre-shared secret
    #[serde(rename = "IPSec")]
    IpSec,
}

impl fmt::Display for VpnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VpnType::IkeV2 => f.write_str("IKEv2"),
            VpnType::IpSec => f.write_str("IPSec"),
        }
    }
}

impl FromStr for VpnType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ikev2" | "ikev2-eap" => Ok(VpnType::IkeV2),
            "ipsec" | "ikev1" => Ok(VpnType::IpSec),
            _ => Err(BridgeError::UnsupportedVpnType(s.to_string())),
        }
    }
}

/// Transient profile for one connect call
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub vpn_type: VpnType,
    pub server: String,
    pub username: String,
    pub password: String,
    pub secret: Option<String>,
    pub name: Option<String>,
}

impl ConnectionProfile {
    pub fn new(server: &str, username: &str, password: &str) -> Self {
        Self {
            vpn_type: VpnType::default(),
            server: server.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            secret: None,
            name: None,
        }
    }

    /// Build a profile from `connect` arguments.
    ///
    /// `Server`, `Username` and `Password` are required. `Type` falls back
    /// to `default_type` when absent.
    pub fn from_arguments(args: &Arguments, default_type: VpnType) -> BridgeResult<Self> {
        let vpn_type = match args.get("Type") {
            Some(t) => t.parse()?,
            None => default_type,
        };

        Ok(Self {
            vpn_type,
            server: args.require("Server")?.to_string(),
            username: args.require("Username")?.to_string(),
            password: args.require("Password")?.to_string(),
            secret: args.get("Secret").map(str::to_string),
            name: args.get("Name").map(str::to_string),
        })
    }

    /// Name shown in the platform VPN settings
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.server)
    }
}

// Credentials stay out of logs.
impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("vpn_type", &self.vpn_type)
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .finish()
    }
}
