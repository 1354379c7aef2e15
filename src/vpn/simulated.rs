//! In-process platform VPN service
//!
//! Walks through the same lifecycle a native service reports
//! (Connecting -> Connected, Disconnecting -> Disabled) with a fixed delay
//! between steps, and notifies its listener on every transition. No
//! tunnel is created. Used by the test suite and by `vpn-bridged` so UI
//! work can proceed without a device.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::profile::ConnectionProfile;
use crate::state::{ConnectionState, ErrorCode};
use super::backend::{ConnectionControllable, StateListener, StateObservable};

struct Inner {
    state: ConnectionState,
    error: ErrorCode,
    listener: Option<Weak<dyn StateListener>>,
    last_profile: Option<ConnectionProfile>,
    prepared: bool,
    pending_failure: Option<ErrorCode>,
}

pub struct SimulatedVpnService {
    inner: Mutex<Inner>,
    step_delay: Duration,
}

impl SimulatedVpnService {
    /// Create a prepared service that waits `step_delay` between lifecycle steps
    pub fn new(step_delay: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Disabled,
                error: ErrorCode::NoError,
                listener: None,
                last_profile: None,
                prepared: true,
                pending_failure: None,
            }),
            step_delay,
        }
    }

    /// Start without VPN permission; `connect` fails until `prepare` runs
    pub fn unprepared(mut self) -> Self {
        self.inner.get_mut().unwrap_or_else(PoisonError::into_inner).prepared = false;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Force a state and notify the listener
    pub fn set_state(&self, state: ConnectionState, error: ErrorCode) {
        self.transition(state, error);
    }

    /// Make the next connect attempt fail with `error`
    pub fn fail_next_connect(&self, error: ErrorCode) {
        self.lock().pending_failure = Some(error);
    }

    /// Profile of the last successful connect
    pub fn last_profile(&self) -> Option<ConnectionProfile> {
        self.lock().last_profile.clone()
    }

    pub fn has_listener(&self) -> bool {
        self.lock()
            .listener
            .as_ref()
            .is_some_and(|l| l.strong_count() > 0)
    }

    fn transition(&self, state: ConnectionState, error: ErrorCode) {
        let listener = {
            let mut inner = self.lock();
            inner.state = state;
            inner.error = error;
            inner.listener.clone()
        };
        debug!("Simulated VPN state: {:?} ({})", state, error);

        // Notify outside the lock; the listener reads state back.
        if let Some(listener) = listener.and_then(|l| l.upgrade()) {
            listener.state_changed();
        }
    }

    async fn step(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }
}

impl Default for SimulatedVpnService {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

impl StateObservable for SimulatedVpnService {
    fn state(&self) -> ConnectionState {
        self.lock().state
    }

    fn error_state(&self) -> ErrorCode {
        self.lock().error
    }

    fn register_listener(&self, listener: Weak<dyn StateListener>) {
        self.lock().listener = Some(listener);
    }

    fn unregister_listener(&self) {
        self.lock().listener = None;
    }
}

#[async_trait]
impl ConnectionControllable for SimulatedVpnService {
    async fn prepare(&self) -> BridgeResult<bool> {
        self.lock().prepared = true;
        Ok(true)
    }

    async fn connect(&self, profile: ConnectionProfile) -> BridgeResult<()> {
        if !self.lock().prepared {
            return Err(BridgeError::PermissionDenied(
                "VPN permission has not been granted".to_string(),
            ));
        }

        info!("Simulated VPN connecting to {} ({})", profile.server, profile.vpn_type);

        if profile.password.is_empty() {
            self.transition(ConnectionState::Disabled, ErrorCode::PasswordMissing);
            return Err(BridgeError::ConnectionFailed {
                reason: ErrorCode::PasswordMissing.to_string(),
            });
        }

        self.transition(ConnectionState::Connecting, ErrorCode::NoError);
        self.step().await;

        let failure = self.lock().pending_failure.take();
        if let Some(error) = failure {
            warn!("Simulated VPN connection to {} failed: {}", profile.server, error);
            self.transition(ConnectionState::Disabled, error);
            return Err(BridgeError::ConnectionFailed {
                reason: error.to_string(),
            });
        }

        self.lock().last_profile = Some(profile);
        self.transition(ConnectionState::Connected, ErrorCode::NoError);
        Ok(())
    }

    async fn reconnect(&self) -> BridgeResult<()> {
        let profile = self
            .last_profile()
            .ok_or_else(|| BridgeError::InvalidState("No previous connection to restore".to_string()))?;

        if self.state() != ConnectionState::Disabled {
            self.disconnect().await?;
        }
        self.connect(profile).await
    }

    async fn disconnect(&self) -> BridgeResult<()> {
        let (state, error) = {
            let inner = self.lock();
            (inner.state, inner.error)
        };

        if state == ConnectionState::Disabled {
            if error.is_error() {
                self.transition(ConnectionState::Disabled, ErrorCode::NoError);
            }
            return Ok(());
        }

        self.transition(ConnectionState::Disconnecting, ErrorCode::NoError);
        self.step().await;
        self.transition(ConnectionState::Disabled, ErrorCode::NoError);
        Ok(())
    }

    fn platform_version(&self) -> String {
        format!("simulated ({})", std::env::consts::OS)
    }
}
