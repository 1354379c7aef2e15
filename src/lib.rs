//! vpnbridge - VPN method/event channel bridge
//!
//! Glue between a cross-platform UI and a native IKEv2/IPsec VPN service
//! (strongSwan charon on Android, NetworkExtension on macOS):
//! - State mirror: republishes the service lifecycle as integer codes
//!   (0 disabled, 1 connecting, 2 connected, 3 disconnecting, 4 error)
//!   on a single-subscriber event channel
//! - Method dispatcher: forwards `connect`, `disconnect`, `reconnect`,
//!   `getCurrentState`, `checkState`, `prepare` and friends to the service
//! - Per-OS translation of native state enums
//! - D-Bus host transport for desktop development
//!
//! Tunnel negotiation, credentials and routing stay in the native service.

pub mod error;
pub mod state;
pub mod channel;
pub mod profile;
pub mod config;
pub mod logging;
pub mod vpn;
pub mod platform;
pub mod mirror;
pub mod dispatcher;
pub mod plugin;
pub mod dbus;

// Re-export commonly used types
pub use error::{BridgeError, BridgeResult};
pub use state::{ConnectionState, ErrorCode, StateCode};
pub use channel::{
    Arguments, ChannelEventSink, EventSink, EventStream, MethodCall, MethodResult,
    METHOD_CHANNEL, STATE_CHANNEL,
};
pub use profile::{ConnectionProfile, VpnType};
pub use config::BridgeConfig;
pub use vpn::{
    ConnectionControllable, PlatformVpnService, SimulatedVpnService, StateListener,
    StateObservable,
};
pub use platform::{NativeBackend, NativeVpnService};
pub use mirror::{ConnectionTimestamps, StateMirror};
pub use dispatcher::{Method, MethodDispatcher};
pub use plugin::VpnPlugin;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
