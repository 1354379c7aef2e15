//! Bridge configuration
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! method_channel = "flutter_vpn"
//! event_channel = "flutter_vpn_states"
//! default_vpn_type = "IKEv2"
//! log_level = "info"
//!
//! [dbus]
//! bus = "session"
//! service_name = "io.xdea.FlutterVpn"
//! object_path = "/io/xdea/FlutterVpn"
//!
//! [simulated]
//! step_delay_ms = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::channel::{METHOD_CHANNEL, STATE_CHANNEL};
use crate::error::{BridgeError, BridgeResult};
use crate::profile::VpnType;

/// D-Bus service name
pub const DBUS_SERVICE: &str = "io.xdea.FlutterVpn";

/// D-Bus object path
pub const DBUS_PATH: &str = "/io/xdea/FlutterVpn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Method channel name
    pub method_channel: String,
    /// State event channel name
    pub event_channel: String,
    /// VPN type used when a connect call has no `Type` argument
    pub default_vpn_type: VpnType,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub dbus: DbusConfig,
    pub simulated: SimulatedConfig,
}

/// Which bus the host transport connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    Session,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbusConfig {
    pub bus: BusKind,
    pub service_name: String,
    pub object_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Delay between lifecycle steps of the simulated service
    pub step_delay_ms: u64,
}

impl SimulatedConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            method_channel: METHOD_CHANNEL.to_string(),
            event_channel: STATE_CHANNEL.to_string(),
            default_vpn_type: VpnType::IkeV2,
            log_level: "info".to_string(),
            dbus: DbusConfig::default(),
            simulated: SimulatedConfig::default(),
        }
    }
}

impl Default for DbusConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::Session,
            service_name: DBUS_SERVICE.to_string(),
            object_path: DBUS_PATH.to_string(),
        }
    }
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self { step_delay_ms: 500 }
    }
}

impl BridgeConfig {
    /// Load a configuration file
    pub async fn load(path: &Path) -> BridgeResult<Self> {
        let contents = fs::read_to_string(path).await?;
        let config: BridgeConfig = contents.parse()?;
        info!("Loaded bridge config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as TOML
    pub async fn save(&self, path: &Path) -> BridgeResult<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| BridgeError::Serialization(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, toml_str).await?;
        info!("Saved bridge config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.method_channel.is_empty() || self.event_channel.is_empty() {
            return Err(BridgeError::Config("Channel names cannot be empty".to_string()));
        }
        if self.method_channel == self.event_channel {
            return Err(BridgeError::Config(
                "Method and event channels must have different names".to_string(),
            ));
        }
        if !self.dbus.object_path.starts_with('/') {
            return Err(BridgeError::Config(format!(
                "Invalid D-Bus object path: {}",
                self.dbus.object_path
            )));
        }
        Ok(())
    }
}

impl FromStr for BridgeConfig {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: BridgeConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
