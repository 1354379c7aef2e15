//! State mirror
//!
//! Republishes the lifecycle of the bound platform VPN service as a stream
//! of integer state codes to at most one event sink.
//!
//! Notifications arrive on whatever thread the native service uses. They
//! are turned into commands on one queue, and a single delivery task owns
//! the sink and applies the commands in order. Subscribing, cancelling and
//! emitting therefore never race, and the sink never sees two deliveries
//! at once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::channel::EventSink;
use crate::error::{BridgeError, BridgeResult};
use crate::state::{ConnectionState, StateCode};
use crate::vpn::{PlatformVpnService, StateListener, StateObservable};

/// Wall-clock times of the last observed transitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionTimestamps {
    pub connected_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

enum MirrorCommand {
    Listen(Arc<dyn EventSink>),
    Cancel,
    Emit(StateCode),
    Flush(oneshot::Sender<()>),
}

#[derive(Default)]
struct Observed {
    last_state: Option<ConnectionState>,
    timestamps: ConnectionTimestamps,
}

pub struct StateMirror {
    commands: mpsc::UnboundedSender<MirrorCommand>,
    service: RwLock<Option<Weak<dyn PlatformVpnService>>>,
    observed: Mutex<Observed>,
}

impl StateMirror {
    /// Create a mirror whose delivery task runs on the current tokio runtime.
    ///
    /// Fails with `InvalidState` when called outside a runtime; hosts that
    /// construct the plugin from a native callback thread use
    /// [`StateMirror::with_runtime`] instead.
    pub fn new() -> BridgeResult<Arc<Self>> {
        let handle = Handle::try_current()
            .map_err(|e| BridgeError::InvalidState(format!("No tokio runtime available: {}", e)))?;
        Ok(Self::with_runtime(&handle))
    }

    /// Create a mirror whose delivery task runs on `runtime`
    pub fn with_runtime(runtime: &Handle) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_delivery(rx));

        Arc::new(Self {
            commands: tx,
            service: RwLock::new(None),
            observed: Mutex::new(Observed::default()),
        })
    }

    fn send(&self, command: MirrorCommand) {
        if self.commands.send(command).is_err() {
            debug!("State mirror delivery task has stopped");
        }
    }

    fn observed(&self) -> MutexGuard<'_, Observed> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Observe `service`. Only a weak reference is kept.
    pub fn bind(&self, service: Weak<dyn PlatformVpnService>) {
        *self.service.write().unwrap_or_else(PoisonError::into_inner) = Some(service);
        self.observed().last_state = None;
        debug!("State mirror bound to VPN service");
    }

    /// Stop observing; later notifications become no-ops
    pub fn unbind(&self) {
        *self.service.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("State mirror unbound from VPN service");
    }

    fn bound_service(&self) -> Option<Arc<dyn PlatformVpnService>> {
        self.service
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Make `sink` the only destination for state events
    pub fn on_subscribe(&self, sink: Arc<dyn EventSink>) {
        self.send(MirrorCommand::Listen(sink));
    }

    /// Drop the current sink
    pub fn on_unsubscribe(&self) {
        self.send(MirrorCommand::Cancel);
    }

    /// Mapped state code of the bound service, `None` when unbound
    pub fn current_code(&self) -> Option<StateCode> {
        self.bound_service()
            .map(|s| StateCode::mirror(s.state(), s.error_state()))
    }

    /// Re-emit the current state code without waiting for a transition
    pub fn check_state(&self) {
        match self.current_code() {
            Some(code) => self.send(MirrorCommand::Emit(code)),
            None => trace!("check_state without a bound service"),
        }
    }

    /// Timestamps of the last observed connect and disconnect
    pub fn timestamps(&self) -> ConnectionTimestamps {
        self.observed().timestamps
    }

    /// Wait until every command queued so far has been applied
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(MirrorCommand::Flush(tx));
        let _ = rx.await;
    }

    fn record_transition(&self, state: ConnectionState) {
        let mut observed = self.observed();
        if observed.last_state == Some(state) {
            return;
        }
        observed.last_state = Some(state);
        match state {
            ConnectionState::Connected => observed.timestamps.connected_at = Some(Utc::now()),
            ConnectionState::Disabled => observed.timestamps.disconnected_at = Some(Utc::now()),
            _ => {}
        }
    }
}

impl StateListener for StateMirror {
    fn state_changed(&self) {
        let Some(service) = self.bound_service() else {
            trace!("State change ignored, no bound service");
            return;
        };

        let state = service.state();
        let error = service.error_state();
        self.record_transition(state);

        let code = StateCode::mirror(state, error);
        if error.is_error() {
            warn!("VPN service reported {:?} with error: {}", state, error);
        } else {
            debug!("VPN service state changed to {:?}", state);
        }
        self.send(MirrorCommand::Emit(code));
    }
}

async fn run_delivery(mut commands: mpsc::UnboundedReceiver<MirrorCommand>) {
    let mut sink: Option<Arc<dyn EventSink>> = None;

    while let Some(command) = commands.recv().await {
        match command {
            MirrorCommand::Listen(new_sink) => {
                if sink.replace(new_sink).is_some() {
                    debug!("State event sink replaced");
                } else {
                    debug!("State event sink attached");
                }
            }
            MirrorCommand::Cancel => {
                if let Some(old) = sink.take() {
                    old.end_of_stream().await;
                    debug!("State event sink cancelled");
                }
            }
            MirrorCommand::Emit(code) => match &sink {
                Some(sink) => sink.success(code.code()).await,
                None => trace!("No state event sink, dropping {:?}", code),
            },
            MirrorCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    trace!("State mirror delivery task finished");
}
