//! Method channel and event channel primitives
//!
//! A method call is a name plus a string keyed argument map. A result is
//! either a JSON success value, an error triple (code, message, details),
//! or `NotImplemented` for names the dispatcher does not know.
//!
//! The event side is an `EventSink`: the single destination the state
//! mirror delivers integer state codes to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{BridgeError, BridgeResult};

/// Default method channel name
pub const METHOD_CHANNEL: &str = "flutter_vpn";

/// Default state event channel name
pub const STATE_CHANNEL: &str = "flutter_vpn_states";

/// String keyed arguments of a method call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments(HashMap<String, String>);

impl Arguments {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Look up a key, falling back to a case-insensitive match
    /// (`Server` and `server` are the same argument).
    ///
    /// An exact match always wins. Among several case-insensitive matches
    /// the byte-wise smallest key is used, so `SERVER` beats `Server` beats
    /// `server` regardless of insertion order.
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(v) = self.0.get(key) {
            return Some(v.as_str());
        }
        self.0
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &str) -> BridgeResult<&str> {
        self.get(key)
            .ok_or_else(|| BridgeError::MissingArgument(key.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<HashMap<String, String>> for Arguments {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// A named remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl MethodCall {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            arguments: Arguments::new(),
        }
    }

    pub fn with_arguments(method: &str, arguments: Arguments) -> Self {
        Self {
            method: method.to_string(),
            arguments,
        }
    }
}

/// Outcome of a method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResult {
    Success {
        value: Value,
    },
    Error {
        code: String,
        message: Option<String>,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResult {
    pub fn success(value: impl Into<Value>) -> Self {
        MethodResult::Success { value: value.into() }
    }

    pub fn null() -> Self {
        MethodResult::Success { value: Value::Null }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResult::Success { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            MethodResult::Success { value } => Some(value),
            _ => None,
        }
    }
}

impl From<BridgeError> for MethodResult {
    fn from(error: BridgeError) -> Self {
        MethodResult::Error {
            code: error.channel_code().to_string(),
            message: Some(error.to_string()),
            details: None,
        }
    }
}

impl<T: Into<Value>> From<BridgeResult<T>> for MethodResult {
    fn from(result: BridgeResult<T>) -> Self {
        match result {
            Ok(value) => MethodResult::success(value),
            Err(e) => e.into(),
        }
    }
}

/// Destination for state events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one state code
    async fn success(&self, event: i32);

    /// Signal that no more events follow
    async fn end_of_stream(&self) {}
}

/// Event sink backed by an in-process channel
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<i32>,
}

/// Receiving half of a [`ChannelEventSink`]
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<i32>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, EventStream { rx })
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn success(&self, event: i32) {
        if self.tx.send(event).is_err() {
            trace!("Event stream receiver dropped, discarding {}", event);
        }
    }
}

impl EventStream {
    /// Wait for the next event. `None` once every sink handle is gone.
    pub async fn next(&mut self) -> Option<i32> {
        self.rx.recv().await
    }

    /// Take every event already delivered without waiting
    pub fn drain(&mut self) -> Vec<i32> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
