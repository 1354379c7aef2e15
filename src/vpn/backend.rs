use async_trait::async_trait;
use std::sync::Weak;

use crate::error::BridgeResult;
use crate::profile::ConnectionProfile;
use crate::state::{ConnectionState, ErrorCode};

/// Receiver of state change notifications from a platform VPN service
///
/// Called from whatever thread the native service reports on, so
/// implementations must not block.
pub trait StateListener: Send + Sync {
    fn state_changed(&self);
}

/// Read side of a platform VPN service
pub trait StateObservable: Send + Sync {
    /// Current lifecycle state
    fn state(&self) -> ConnectionState;

    /// Current error sub-code
    fn error_state(&self) -> ErrorCode;

    /// Register the listener notified on every lifecycle transition.
    /// Replaces any previous listener. The service only keeps a weak
    /// reference.
    fn register_listener(&self, listener: Weak<dyn StateListener>);

    /// Drop the registered listener
    fn unregister_listener(&self);
}

/// Imperative side of a platform VPN service
///
/// Every operation completes asynchronously. Timeouts and retries belong
/// to the implementation.
#[async_trait]
pub trait ConnectionControllable: Send + Sync {
    /// Platform pre-flight authorization (VPN permission grant).
    /// Returns whether the service is authorized to create tunnels.
    async fn prepare(&self) -> BridgeResult<bool>;

    /// Start a tunnel for the given profile
    async fn connect(&self, profile: ConnectionProfile) -> BridgeResult<()>;

    /// Re-establish the last tunnel
    async fn reconnect(&self) -> BridgeResult<()>;

    /// Tear down the active tunnel
    async fn disconnect(&self) -> BridgeResult<()>;

    /// Human readable platform version, e.g. "macOS 14.2"
    fn platform_version(&self) -> String {
        std::env::consts::OS.to_string()
    }
}

/// Full platform VPN service contract
pub trait PlatformVpnService: StateObservable + ConnectionControllable {}

impl<T: StateObservable + ConnectionControllable> PlatformVpnService for T {}
