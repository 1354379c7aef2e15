//! VPN bridge development daemon (vpn-bridged)
//!
//! Serves the method channel and state event channel over D-Bus, backed by
//! the simulated VPN service. Lets desktop UI work proceed against the
//! real channel contract without a device or a tunnel.
//!
//! # Usage
//!
//! ```bash
//! # Session bus, default config
//! vpn-bridged
//!
//! # Custom config and faster simulated transitions
//! vpn-bridged --config bridge.toml --step-delay-ms 50 --verbose
//! ```

use clap::Parser;
use libvpnbridge::config::{BridgeConfig, BusKind};
use libvpnbridge::dbus;
use libvpnbridge::error::BridgeResult;
use libvpnbridge::logging::init_logging;
use libvpnbridge::vpn::SimulatedVpnService;
use libvpnbridge::VpnPlugin;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// VPN bridge development daemon
#[derive(Parser, Debug)]
#[command(name = "vpn-bridged")]
#[command(version)]
#[command(about = "Serves the VPN method/event channels over D-Bus with a simulated VPN service", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Use the system bus instead of the session bus
    #[arg(long)]
    system: bool,

    /// Delay between simulated lifecycle steps in milliseconds
    #[arg(long)]
    step_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> BridgeResult<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path).await?,
        None => BridgeConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if args.system {
        config.dbus.bus = BusKind::System;
    }
    if let Some(delay) = args.step_delay_ms {
        config.simulated.step_delay_ms = delay;
    }

    init_logging(&config.log_level, args.verbose);

    info!("Starting VPN bridge daemon (vpn-bridged)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let step_delay = config.simulated.step_delay();
    let plugin = VpnPlugin::new(config)?;
    plugin.bind(Arc::new(SimulatedVpnService::new(step_delay)));

    let _connection = match dbus::serve(plugin.clone()).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to start D-Bus transport: {}", e);
            return Err(e);
        }
    };

    info!(
        "VPN bridge ready (method channel: {}, event channel: {})",
        plugin.method_channel(),
        plugin.event_channel()
    );

    wait_for_shutdown().await?;

    info!("Shutting down VPN bridge daemon...");
    plugin.cancel();
    plugin.mirror().flush().await;
    plugin.unbind();
    info!("VPN bridge daemon stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() -> BridgeResult<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating graceful shutdown");
    }

    Ok(())
}
