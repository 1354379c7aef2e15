//! Per-OS adapters
//!
//! Each OS binding (JNI over the strongSwan `VpnStateService`, Objective-C
//! over `NEVPNManager`) only has to implement [`NativeBackend`]: report its
//! native status and error values and expose the imperative calls.
//! [`NativeVpnService`] turns that into a [`PlatformVpnService`], so state
//! translation and listener bookkeeping are written once.
//!
//! [`PlatformVpnService`]: crate::vpn::PlatformVpnService

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError, Weak};
use tracing::trace;

use crate::error::BridgeResult;
use crate::profile::ConnectionProfile;
use crate::state::{ConnectionState, ErrorCode};
use crate::vpn::{ConnectionControllable, StateListener, StateObservable};

pub mod android;
pub mod macos;

/// Native VPN binding for one OS
#[async_trait]
pub trait NativeBackend: Send + Sync {
    /// Native lifecycle value
    type Status: Copy + Into<ConnectionState> + Send;
    /// Native error value
    type Error: Copy + Into<ErrorCode> + Send;

    fn status(&self) -> Self::Status;
    fn last_error(&self) -> Self::Error;

    async fn prepare(&self) -> BridgeResult<bool>;
    async fn start(&self, profile: ConnectionProfile) -> BridgeResult<()>;
    async fn restart(&self) -> BridgeResult<()>;
    async fn stop(&self) -> BridgeResult<()>;

    fn platform_version(&self) -> String;
}

/// Platform VPN service over a native binding
pub struct NativeVpnService<B> {
    backend: B,
    listener: Mutex<Option<Weak<dyn StateListener>>>,
}

impl<B: NativeBackend> NativeVpnService<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            listener: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Entry point for the native status observer. May be called from any
    /// thread.
    pub fn notify_state_changed(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match listener.and_then(|l| l.upgrade()) {
            Some(listener) => listener.state_changed(),
            None => trace!("Native state change with no listener registered"),
        }
    }
}

impl<B: NativeBackend> StateObservable for NativeVpnService<B> {
    fn state(&self) -> ConnectionState {
        self.backend.status().into()
    }

    fn error_state(&self) -> ErrorCode {
        self.backend.last_error().into()
    }

    fn register_listener(&self, listener: Weak<dyn StateListener>) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    fn unregister_listener(&self) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl<B: NativeBackend> ConnectionControllable for NativeVpnService<B> {
    async fn prepare(&self) -> BridgeResult<bool> {
        self.backend.prepare().await
    }

    async fn connect(&self, profile: ConnectionProfile) -> BridgeResult<()> {
        self.backend.start(profile).await
    }

    async fn reconnect(&self) -> BridgeResult<()> {
        self.backend.restart().await
    }

    async fn disconnect(&self) -> BridgeResult<()> {
        self.backend.stop().await
    }

    fn platform_version(&self) -> String {
        self.backend.platform_version()
    }
}
