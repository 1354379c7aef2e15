//! Platform VPN service contract
//!
//! The bridge never drives a tunnel itself. It talks to a platform VPN
//! service through two capability traits:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  MethodDispatcher        StateMirror     │
//! └──────┬─────────────────────────▲─────────┘
//!        │ ConnectionControllable  │ StateObservable + StateListener
//!        ▼                         │
//! ┌──────────────────────────────────────────┐
//! │          PlatformVpnService              │
//! └──────┬───────────────┬───────────────────┘
//!        │               │
//!        ▼               ▼
//! ┌─────────────┐  ┌──────────────┐
//! │ NativeVpn-  │  │ SimulatedVpn │  <- implementations
//! │ Service<B>  │  │ Service      │
//! └─────────────┘  └──────────────┘
//! ```
//!
//! `NativeVpnService` (see [`crate::platform`]) wraps the strongSwan and
//! NetworkExtension bindings. `SimulatedVpnService` is an in-process
//! service for tests and the development daemon.

pub mod backend;
pub mod simulated;

pub use backend::{ConnectionControllable, PlatformVpnService, StateListener, StateObservable};
pub use simulated::SimulatedVpnService;
