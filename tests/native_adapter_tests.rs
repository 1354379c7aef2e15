//! Native Adapter Tests
//!
//! A fake strongSwan and a fake NetworkExtension binding plugged into
//! `NativeVpnService`, bound to a plugin, with native status changes pushed
//! through `notify_state_changed` the way the OS observers do.

use async_trait::async_trait;
use libvpnbridge::platform::android::{CharonErrorState, CharonState};
use libvpnbridge::platform::macos::{NeVpnError, NeVpnStatus};
use libvpnbridge::{
    BridgeConfig, BridgeResult, ChannelEventSink, ConnectionProfile, MethodCall, NativeBackend,
    NativeVpnService, VpnPlugin,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

struct FakeBackend<S, E> {
    current: Mutex<(S, E)>,
    started: Mutex<Option<ConnectionProfile>>,
    version: &'static str,
}

impl<S: Copy, E: Copy> FakeBackend<S, E> {
    fn new(status: S, error: E, version: &'static str) -> Self {
        Self {
            current: Mutex::new((status, error)),
            started: Mutex::new(None),
            version,
        }
    }

    fn set(&self, status: S, error: E) {
        *self.current.lock().unwrap() = (status, error);
    }
}

#[async_trait]
impl<S, E> NativeBackend for FakeBackend<S, E>
where
    S: Copy + Into<libvpnbridge::ConnectionState> + Send + Sync,
    E: Copy + Into<libvpnbridge::ErrorCode> + Send + Sync,
{
    type Status = S;
    type Error = E;

    fn status(&self) -> S {
        self.current.lock().unwrap().0
    }

    fn last_error(&self) -> E {
        self.current.lock().unwrap().1
    }

    async fn prepare(&self) -> BridgeResult<bool> {
        Ok(true)
    }

    async fn start(&self, profile: ConnectionProfile) -> BridgeResult<()> {
        *self.started.lock().unwrap() = Some(profile);
        Ok(())
    }

    async fn restart(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        Ok(())
    }

    fn platform_version(&self) -> String {
        self.version.to_string()
    }
}

#[tokio::test]
async fn test_charon_lifecycle_reaches_event_stream() {
    let service = Arc::new(NativeVpnService::new(FakeBackend::new(
        CharonState::Disabled,
        CharonErrorState::NoError,
        "Android 14",
    )));
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();
    plugin.bind(service.clone());

    let (sink, mut stream) = ChannelEventSink::new();
    plugin.listen(Arc::new(sink));

    for state in [CharonState::Connecting, CharonState::Connected, CharonState::Disconnecting, CharonState::Disabled] {
        service.backend().set(state, CharonErrorState::NoError);
        service.notify_state_changed();
    }
    service.backend().set(CharonState::Connecting, CharonErrorState::LookupFailed);
    service.notify_state_changed();

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![1, 2, 3, 0, 4]);

    let error = plugin.handle_method_call(MethodCall::new("getCharonErrorState")).await;
    assert_eq!(error.value(), Some(&json!(3)));
}

#[tokio::test]
async fn test_network_extension_status_translation() {
    let service = Arc::new(NativeVpnService::new(FakeBackend::new(
        NeVpnStatus::Invalid,
        NeVpnError::None,
        "macOS 14.2",
    )));
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();
    plugin.bind(service.clone());

    let (sink, mut stream) = ChannelEventSink::new();
    plugin.listen(Arc::new(sink));

    for status in [NeVpnStatus::Connecting, NeVpnStatus::Connected, NeVpnStatus::Reasserting, NeVpnStatus::Connected] {
        service.backend().set(status, NeVpnError::None);
        service.notify_state_changed();
    }
    service.backend().set(NeVpnStatus::Disconnected, NeVpnError::Connection(8));
    service.notify_state_changed();

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![1, 2, 1, 2, 4]);

    let version = plugin.handle_method_call(MethodCall::new("getPlatformVersion")).await;
    assert_eq!(version.value(), Some(&json!("macOS 14.2")));
}

#[tokio::test]
async fn test_connect_forwards_profile_to_native_binding() {
    let service = Arc::new(NativeVpnService::new(FakeBackend::new(
        CharonState::Disabled,
        CharonErrorState::NoError,
        "Android 14",
    )));
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();
    plugin.bind(service.clone());

    let call = MethodCall::with_arguments(
        "connect",
        libvpnbridge::Arguments::new()
            .with("Server", "vpn.example.com")
            .with("Username", "u")
            .with("Password", "p")
            .with("Name", "Office"),
    );
    assert!(plugin.handle_method_call(call).await.is_success());

    let started = service.backend().started.lock().unwrap().clone().unwrap();
    assert_eq!(started.server, "vpn.example.com");
    assert_eq!(started.display_name(), "Office");
}

#[tokio::test]
async fn test_unbind_silences_native_notifications() {
    let service = Arc::new(NativeVpnService::new(FakeBackend::new(
        CharonState::Disabled,
        CharonErrorState::NoError,
        "Android 14",
    )));
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();
    plugin.bind(service.clone());

    let (sink, mut stream) = ChannelEventSink::new();
    plugin.listen(Arc::new(sink));
    plugin.unbind();

    service.backend().set(CharonState::Connected, CharonErrorState::NoError);
    service.notify_state_changed();

    plugin.mirror().flush().await;
    assert!(stream.drain().is_empty());
}

#[tokio::test]
async fn test_notifications_from_native_threads() {
    let service = Arc::new(NativeVpnService::new(FakeBackend::new(
        CharonState::Connected,
        CharonErrorState::NoError,
        "Android 14",
    )));
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();
    plugin.bind(service.clone());

    let (sink, mut stream) = ChannelEventSink::new();
    plugin.listen(Arc::new(sink));

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    service.notify_state_changed();
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    plugin.mirror().flush().await;
    let events = stream.drain();
    assert_eq!(events.len(), 100);
    assert!(events.iter().all(|&code| code == 2));
}

#[tokio::test]
async fn test_rebinding_same_native_service() {
    let service = Arc::new(NativeVpnService::new(FakeBackend::new(
        CharonState::Disabled,
        CharonErrorState::NoError,
        "Android 14",
    )));
    let plugin = VpnPlugin::new(BridgeConfig::default()).unwrap();

    // Host service connection callback firing twice for one service
    plugin.bind(service.clone());
    plugin.bind(service.clone());

    let (sink, mut stream) = ChannelEventSink::new();
    plugin.listen(Arc::new(sink));
    service.backend().set(CharonState::Connecting, CharonErrorState::NoError);
    service.notify_state_changed();

    plugin.mirror().flush().await;
    assert_eq!(stream.drain(), vec![1]);
}
