//! Plugin Integration Tests
//!
//! Drive a `VpnPlugin` through its method channel and event channel the
//! way a UI host does, with the simulated VPN service bound.

use chrono::Utc;
use libvpnbridge::{
    Arguments, BridgeConfig, ChannelEventSink, ConnectionState, ErrorCode, EventStream,
    MethodCall, MethodResult, SimulatedVpnService, VpnPlugin,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn bound_plugin(step_delay: Duration) -> (Arc<VpnPlugin>, Arc<SimulatedVpnService>) {
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();
    let service = Arc::new(SimulatedVpnService::new(step_delay));
    plugin.bind(service.clone());
    (plugin, service)
}

fn subscribe(plugin: &VpnPlugin) -> EventStream {
    let (sink, stream) = ChannelEventSink::new();
    plugin.listen(Arc::new(sink));
    stream
}

fn connect_call(server: Option<&str>) -> MethodCall {
    let mut args = Arguments::new().with("Username", "u").with("Password", "p");
    if let Some(server) = server {
        args.insert("Server", server);
    }
    MethodCall::with_arguments("connect", args)
}

// =============================================================================
// End-to-end lifecycle
// =============================================================================

#[tokio::test]
async fn test_connect_emits_connecting_then_connected() {
    let (plugin, _service) = bound_plugin(Duration::from_millis(5));
    let mut stream = subscribe(&plugin);

    let call_time = Utc::now();
    let result = plugin.handle_method_call(connect_call(Some("vpn.example.com"))).await;
    assert!(result.is_success(), "connect failed: {:?}", result);

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![1, 2]);

    let connected_at = plugin.mirror().timestamps().connected_at.expect("connect timestamp");
    assert!(connected_at > call_time);
}

#[tokio::test]
async fn test_disconnect_emits_disconnecting_then_disabled() {
    let (plugin, _service) = bound_plugin(Duration::ZERO);
    plugin.handle_method_call(connect_call(Some("vpn.example.com"))).await;

    let mut stream = subscribe(&plugin);
    let result = plugin.handle_method_call(MethodCall::new("disconnect")).await;
    assert!(result.is_success());

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![3, 0]);

    let timestamps = plugin.mirror().timestamps();
    assert!(timestamps.disconnected_at.unwrap() >= timestamps.connected_at.unwrap());
}

#[tokio::test]
async fn test_reconnect_cycles_tunnel() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    plugin.handle_method_call(connect_call(Some("vpn.example.com"))).await;

    let mut stream = subscribe(&plugin);
    let result = plugin.handle_method_call(MethodCall::new("reconnect")).await;
    assert!(result.is_success());

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![3, 0, 1, 2]);
    assert_eq!(service.last_profile().unwrap().server, "vpn.example.com");
}

#[tokio::test]
async fn test_failed_connect_reports_error_code() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    service.fail_next_connect(ErrorCode::AuthFailed);
    let mut stream = subscribe(&plugin);

    let result = plugin.handle_method_call(connect_call(Some("vpn.example.com"))).await;
    assert!(matches!(result, MethodResult::Error { ref code, .. } if code == "CONNECTION_FAILED"));

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![1, 4]);

    let state = plugin.handle_method_call(MethodCall::new("getCurrentState")).await;
    assert_eq!(state.value(), Some(&json!(4)));
    let error = plugin.handle_method_call(MethodCall::new("getCharonErrorState")).await;
    assert_eq!(error.value(), Some(&json!(1)));
}

// =============================================================================
// Subscription handling
// =============================================================================

#[tokio::test]
async fn test_second_subscriber_replaces_first() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    let mut first = subscribe(&plugin);
    let mut second = subscribe(&plugin);

    service.set_state(ConnectionState::Connecting, ErrorCode::NoError);
    plugin.mirror().flush().await;

    assert!(first.drain().is_empty());
    assert_eq!(second.drain(), vec![1]);
}

#[tokio::test]
async fn test_cancel_stops_delivery() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    let mut stream = subscribe(&plugin);
    plugin.cancel();

    service.set_state(ConnectionState::Connected, ErrorCode::NoError);
    plugin.mirror().flush().await;
    assert!(stream.drain().is_empty());

    // The sink handle was released, so the stream ends
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn test_check_state_reemits_current_value() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    service.set_state(ConnectionState::Connected, ErrorCode::NoError);

    // Late subscriber sees nothing until checkState
    let mut stream = subscribe(&plugin);
    plugin.mirror().flush().await;
    assert!(stream.drain().is_empty());

    let result = plugin.handle_method_call(MethodCall::new("checkState")).await;
    assert_eq!(result, MethodResult::null());
    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![2]);
}

// =============================================================================
// Method channel contract
// =============================================================================

#[tokio::test]
async fn test_connect_without_server_fails_cleanly() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    let mut stream = subscribe(&plugin);

    let result = plugin.handle_method_call(connect_call(None)).await;
    match result {
        MethodResult::Error { code, message, .. } => {
            assert_eq!(code, "INVALID_ARGUMENT");
            assert!(message.unwrap().contains("Server"));
        }
        other => panic!("unexpected result {:?}", other),
    }

    plugin.mirror().flush().await;
    assert!(stream.drain().is_empty());
    assert_eq!(service.last_profile(), None);
}

#[tokio::test]
async fn test_unknown_method_not_implemented() {
    let (plugin, _service) = bound_plugin(Duration::ZERO);
    let result = plugin.handle_method_call(MethodCall::new("teleport")).await;
    assert_eq!(result, MethodResult::NotImplemented);
}

#[tokio::test]
async fn test_lowercase_argument_keys() {
    let (plugin, service) = bound_plugin(Duration::ZERO);
    let args = Arguments::new()
        .with("type", "IPSec")
        .with("server", "vpn.example.com")
        .with("username", "u")
        .with("password", "p")
        .with("secret", "psk");
    let result = plugin.handle_method_call(MethodCall::with_arguments("connect", args)).await;
    assert!(result.is_success());

    let profile = service.last_profile().unwrap();
    assert_eq!(profile.secret.as_deref(), Some("psk"));
}

#[tokio::test]
async fn test_dispatch_delivers_result_to_callback() {
    let (plugin, _service) = bound_plugin(Duration::from_millis(5));
    let mut stream = subscribe(&plugin);
    let (tx, rx) = tokio::sync::oneshot::channel();

    plugin.dispatch(connect_call(Some("vpn.example.com")), move |result| {
        let _ = tx.send(result);
    });

    let result = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("reply within timeout")
        .expect("reply sent");
    assert!(result.is_success());

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![1, 2]);
}

#[tokio::test]
async fn test_platform_version() {
    let (plugin, _service) = bound_plugin(Duration::ZERO);
    let result = plugin.handle_method_call(MethodCall::new("getPlatformVersion")).await;
    let version = result.value().and_then(|v| v.as_str()).unwrap().to_string();
    assert!(version.starts_with("simulated"));
}

#[test]
fn test_config_parsing() {
    let config = tokio_test::assert_ok!("event_channel = \"vpn_states\"".parse::<BridgeConfig>());
    assert_eq!(config.event_channel, "vpn_states");
    tokio_test::assert_err!("event_channel = \"flutter_vpn\"".parse::<BridgeConfig>());
}
