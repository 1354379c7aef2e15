//! Logging setup for binaries embedding the bridge

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (or `debug` when `verbose`)
/// applies to the bridge crates.
pub fn init_logging(level: &str, verbose: bool) {
    let log_level = if verbose { "debug" } else { level };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .try_init();
}

fn default_directives(level: &str) -> String {
    format!("libvpnbridge={},vpn_bridged={}", level, level)
}
