//! D-Bus host transport
//!
//! Exposes one plugin's method channel and state event channel on a
//! D-Bus bus so a desktop UI process can drive it.
//!
//! - **Service Name**: `io.xdea.FlutterVpn` (configurable)
//! - **Object Path**: `/io/xdea/FlutterVpn` (configurable)
//! - **Interface**: `io.xdea.FlutterVpn`
//!
//! | Member | Kind | Purpose |
//! |---|---|---|
//! | `InvokeMethod(s, a{ss}) -> s` | method | method channel call, JSON encoded result |
//! | `Listen()` | method | attach the bus as the state event sink |
//! | `Cancel()` | method | detach the state event sink |
//! | `StateChanged(i)` | signal | one state code per event |
//! | `MethodChannel`, `EventChannel` | properties | configured channel names |
//!
//! ```bash
//! busctl --user call io.xdea.FlutterVpn /io/xdea/FlutterVpn \
//!     io.xdea.FlutterVpn InvokeMethod sa{ss} getCurrentState 0
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{fdo, interface, Connection};

use crate::channel::{EventSink, MethodCall, MethodResult};
use crate::config::BusKind;
use crate::error::BridgeResult;
use crate::plugin::VpnPlugin;

/// D-Bus interface name
pub const DBUS_INTERFACE: &str = "io.xdea.FlutterVpn";

pub struct FlutterVpnInterface {
    plugin: Arc<VpnPlugin>,
    object_path: String,
}

impl FlutterVpnInterface {
    pub fn new(plugin: Arc<VpnPlugin>, object_path: String) -> Self {
        Self { plugin, object_path }
    }
}

#[interface(name = "io.xdea.FlutterVpn")]
impl FlutterVpnInterface {
    /// Invoke a method channel call
    async fn invoke_method(
        &self,
        method: &str,
        arguments: HashMap<String, String>,
    ) -> fdo::Result<String> {
        debug!("D-Bus: InvokeMethod {} ({} arguments)", method, arguments.len());
        let call = MethodCall::with_arguments(method, arguments.into());
        let result = self.plugin.handle_method_call(call).await;
        encode_result(method, result)
    }

    /// Make this bus connection the state event sink
    async fn listen(&self, #[zbus(connection)] connection: &Connection) {
        info!("D-Bus: state events attached");
        let sink = DbusEventSink::new(connection.clone(), self.object_path.clone());
        self.plugin.listen(Arc::new(sink));
    }

    /// Detach the state event sink
    async fn cancel(&self) {
        info!("D-Bus: state events detached");
        self.plugin.cancel();
    }

    #[zbus(property)]
    async fn method_channel(&self) -> String {
        self.plugin.method_channel().to_string()
    }

    #[zbus(property)]
    async fn event_channel(&self) -> String {
        self.plugin.event_channel().to_string()
    }

    /// StateChanged signal - one state code per event
    #[zbus(signal)]
    async fn state_changed(signal_emitter: &SignalEmitter<'_>, code: i32) -> zbus::Result<()>;
}

/// Encode a method result for the D-Bus reply
fn encode_result(method: &str, result: MethodResult) -> fdo::Result<String> {
    match result {
        MethodResult::Success { value } => serde_json::to_string(&value)
            .map_err(|e| fdo::Error::Failed(format!("Failed to encode result: {}", e))),
        MethodResult::Error { code, message, .. } => {
            let text = match message {
                Some(message) => format!("{}: {}", code, message),
                None => code.clone(),
            };
            if code == "INVALID_ARGUMENT" {
                Err(fdo::Error::InvalidArgs(text))
            } else {
                Err(fdo::Error::Failed(text))
            }
        }
        MethodResult::NotImplemented => Err(fdo::Error::UnknownMethod(format!(
            "Method '{}' is not implemented",
            method
        ))),
    }
}

/// Event sink emitting `StateChanged` signals
pub struct DbusEventSink {
    connection: Connection,
    object_path: String,
}

impl DbusEventSink {
    pub fn new(connection: Connection, object_path: String) -> Self {
        Self {
            connection,
            object_path,
        }
    }
}

#[async_trait]
impl EventSink for DbusEventSink {
    async fn success(&self, event: i32) {
        match self
            .connection
            .object_server()
            .interface::<_, FlutterVpnInterface>(self.object_path.as_str())
            .await
        {
            Ok(iface_ref) => {
                if let Err(e) = FlutterVpnInterface::state_changed(iface_ref.signal_emitter(), event).await {
                    warn!("Failed to emit StateChanged({}): {}", event, e);
                }
            }
            Err(e) => warn!("D-Bus interface not registered at {}: {}", self.object_path, e),
        }
    }
}

/// Connect to the configured bus and serve `plugin` on it
pub async fn serve(plugin: Arc<VpnPlugin>) -> BridgeResult<Connection> {
    let dbus = plugin.config().dbus.clone();
    info!("Starting D-Bus transport on the {:?} bus", dbus.bus);

    let connection = match dbus.bus {
        BusKind::Session => Connection::session().await?,
        BusKind::System => Connection::system().await?,
    };

    let iface = FlutterVpnInterface::new(plugin, dbus.object_path.clone());
    connection
        .object_server()
        .at(dbus.object_path.as_str(), iface)
        .await?;
    info!("Registered {} at {}", DBUS_INTERFACE, dbus.object_path);

    match connection.request_name(dbus.service_name.as_str()).await {
        Ok(_) => info!("Registered D-Bus service: {}", dbus.service_name),
        Err(e) => {
            warn!("Failed to request D-Bus name '{}': {}", dbus.service_name, e);
            // Still reachable by unique name
        }
    }

    Ok(connection)
}
