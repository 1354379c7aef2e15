//! Method dispatcher
//!
//! Forwards named method channel calls to the bound platform VPN service.
//! Each call is independent and the dispatcher keeps no state between
//! calls.

use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::channel::{Arguments, MethodCall, MethodResult};
use crate::error::BridgeError;
use crate::mirror::StateMirror;
use crate::profile::{ConnectionProfile, VpnType};
use crate::state::StateCode;
use crate::vpn::{ConnectionControllable, PlatformVpnService, StateObservable};

/// Method names understood on the method channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Connect,
    Reconnect,
    Disconnect,
    GetCurrentState,
    GetCharonErrorState,
    CheckState,
    Prepare,
    Prepared,
    GetPlatformVersion,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Connect => "connect",
            Method::Reconnect => "reconnect",
            Method::Disconnect => "disconnect",
            Method::GetCurrentState => "getCurrentState",
            Method::GetCharonErrorState => "getCharonErrorState",
            Method::CheckState => "checkState",
            Method::Prepare => "prepare",
            Method::Prepared => "prepared",
            Method::GetPlatformVersion => "getPlatformVersion",
        }
    }
}

impl FromStr for Method {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connect" => Ok(Method::Connect),
            "reconnect" => Ok(Method::Reconnect),
            "disconnect" => Ok(Method::Disconnect),
            "getCurrentState" => Ok(Method::GetCurrentState),
            "getCharonErrorState" => Ok(Method::GetCharonErrorState),
            "checkState" => Ok(Method::CheckState),
            "prepare" => Ok(Method::Prepare),
            "prepared" => Ok(Method::Prepared),
            "getPlatformVersion" => Ok(Method::GetPlatformVersion),
            _ => Err(BridgeError::InvalidArgument(format!("Unknown method: {}", s))),
        }
    }
}

pub struct MethodDispatcher {
    service: Arc<dyn PlatformVpnService>,
    mirror: Arc<StateMirror>,
    default_vpn_type: VpnType,
}

impl MethodDispatcher {
    pub fn new(
        service: Arc<dyn PlatformVpnService>,
        mirror: Arc<StateMirror>,
        default_vpn_type: VpnType,
    ) -> Self {
        Self {
            service,
            mirror,
            default_vpn_type,
        }
    }

    /// Run a call to completion
    pub async fn handle(&self, call: MethodCall) -> MethodResult {
        let Ok(method) = call.method.parse::<Method>() else {
            debug!("Method not implemented: {}", call.method);
            return MethodResult::NotImplemented;
        };
        self.invoke(method, &call.arguments).await
    }

    /// Run an already resolved method
    pub async fn invoke(&self, method: Method, arguments: &Arguments) -> MethodResult {
        debug!("Dispatching method call: {}", method.name());

        match method {
            Method::Connect => {
                let profile = match ConnectionProfile::from_arguments(arguments, self.default_vpn_type) {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!("Rejecting connect call: {}", e);
                        return e.into();
                    }
                };
                info!("Connecting to {} as {}", profile.server, profile.username);
                self.service.connect(profile).await.map(|()| Value::Null).into()
            }
            Method::Reconnect => {
                info!("Reconnecting last VPN tunnel");
                self.service.reconnect().await.map(|()| Value::Null).into()
            }
            Method::Disconnect => {
                info!("Disconnecting VPN tunnel");
                self.service.disconnect().await.map(|()| Value::Null).into()
            }
            Method::GetCurrentState => {
                let code = StateCode::mirror(self.service.state(), self.service.error_state());
                MethodResult::success(code.code())
            }
            Method::GetCharonErrorState => MethodResult::success(self.service.error_state().code()),
            Method::CheckState => {
                self.mirror.check_state();
                MethodResult::null()
            }
            Method::Prepare | Method::Prepared => self.service.prepare().await.into(),
            Method::GetPlatformVersion => MethodResult::success(self.service.platform_version()),
        }
    }

    /// Run a call in the background and hand its result to `reply`.
    /// Returns immediately; no timeout is applied.
    pub fn dispatch<F>(self: &Arc<Self>, call: MethodCall, reply: F) -> JoinHandle<()>
    where
        F: FnOnce(MethodResult) + Send + 'static,
    {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let result = dispatcher.handle(call).await;
            reply(result);
        })
    }
}
