//! Plugin instance
//!
//! Owns one state mirror and, while a platform VPN service is bound, one
//! method dispatcher for it. `bind` / `unbind` follow the host's service
//! connection lifecycle; binding again replaces the previous service.

use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::channel::{EventSink, MethodCall, MethodResult};
use crate::config::BridgeConfig;
use crate::dispatcher::{Method, MethodDispatcher};
use crate::error::{BridgeError, BridgeResult};
use crate::mirror::StateMirror;
use crate::vpn::{PlatformVpnService, StateListener, StateObservable};

struct Binding {
    service: Arc<dyn PlatformVpnService>,
    dispatcher: Arc<MethodDispatcher>,
}

pub struct VpnPlugin {
    config: BridgeConfig,
    mirror: Arc<StateMirror>,
    binding: RwLock<Option<Binding>>,
}

impl VpnPlugin {
    /// Create an unbound plugin on the current tokio runtime.
    ///
    /// Fails with `InvalidState` when called outside a runtime.
    pub fn new(config: BridgeConfig) -> BridgeResult<Arc<Self>> {
        let runtime = Handle::try_current()
            .map_err(|e| BridgeError::InvalidState(format!("No tokio runtime available: {}", e)))?;
        Ok(Self::with_runtime(config, &runtime))
    }

    /// Create an unbound plugin whose state delivery runs on `runtime`.
    /// Usable from threads that are not part of any runtime.
    pub fn with_runtime(config: BridgeConfig, runtime: &Handle) -> Arc<Self> {
        info!(
            "VPN plugin created (method channel: {}, event channel: {})",
            config.method_channel, config.event_channel
        );
        Arc::new(Self {
            config,
            mirror: StateMirror::with_runtime(runtime),
            binding: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn method_channel(&self) -> &str {
        &self.config.method_channel
    }

    pub fn event_channel(&self) -> &str {
        &self.config.event_channel
    }

    pub fn mirror(&self) -> &Arc<StateMirror> {
        &self.mirror
    }

    /// Attach the platform VPN service. Binding again, with the same or a
    /// different service, re-initializes the mirror.
    pub fn bind(&self, service: Arc<dyn PlatformVpnService>) {
        let mut binding = self.binding.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = binding.take() {
            if same_service(&previous.service, &service) {
                debug!("Rebinding the same VPN service");
            } else {
                previous.service.unregister_listener();
                debug!("Replaced previously bound VPN service");
            }
        }

        // The mirror must know the service before the first notification can arrive.
        self.mirror.bind(Arc::downgrade(&service));
        let listener: Arc<dyn StateListener> = self.mirror.clone();
        service.register_listener(Arc::downgrade(&listener));

        let dispatcher = Arc::new(MethodDispatcher::new(
            service.clone(),
            self.mirror.clone(),
            self.config.default_vpn_type,
        ));
        *binding = Some(Binding { service, dispatcher });
        info!("VPN service bound");
    }

    /// Detach the platform VPN service
    pub fn unbind(&self) {
        let previous = self
            .binding
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(previous) = previous {
            previous.service.unregister_listener();
            self.mirror.unbind();
            info!("VPN service unbound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn dispatcher(&self) -> Option<Arc<MethodDispatcher>> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.dispatcher.clone())
    }

    /// Event channel `onListen`
    pub fn listen(&self, sink: Arc<dyn EventSink>) {
        debug!("Event channel {} listening", self.config.event_channel);
        self.mirror.on_subscribe(sink);
    }

    /// Event channel `onCancel`
    pub fn cancel(&self) {
        debug!("Event channel {} cancelled", self.config.event_channel);
        self.mirror.on_unsubscribe();
    }

    /// Method channel entry point
    pub async fn handle_method_call(&self, call: MethodCall) -> MethodResult {
        let Ok(method) = call.method.parse::<Method>() else {
            debug!("Method not implemented: {}", call.method);
            return MethodResult::NotImplemented;
        };

        match self.dispatcher() {
            Some(dispatcher) => dispatcher.invoke(method, &call.arguments).await,
            None => BridgeError::ServiceUnavailable(format!(
                "No VPN service bound for '{}'",
                call.method
            ))
            .into(),
        }
    }

    /// Method channel entry point with callback delivery
    pub fn dispatch<F>(self: &Arc<Self>, call: MethodCall, reply: F) -> JoinHandle<()>
    where
        F: FnOnce(MethodResult) + Send + 'static,
    {
        let plugin = Arc::clone(self);
        tokio::spawn(async move {
            let result = plugin.handle_method_call(call).await;
            reply(result);
        })
    }
}

fn same_service(a: &Arc<dyn PlatformVpnService>, b: &Arc<dyn PlatformVpnService>) -> bool {
    // Data pointers only; one type may have several vtables.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl Drop for VpnPlugin {
    fn drop(&mut self) {
        self.unbind();
        debug!("VpnPlugin dropped");
    }
}
