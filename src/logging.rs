//! Diagnostic logging for the engine and the CLI.
//!
//! Log lines go to stderr and are filtered by `RUST_LOG`. They are separate
//! from the JSONL run trace (`trace::logger`), which is a product artifact
//! written only when a trace path is configured.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level follows the CLI verbosity:
/// none → `warn`, `-v` → `info`, `-vv` → `debug`, `-vvv` → `trace`.
///
/// # Example
/// ```bash
/// RUST_LOG=apk_controller=debug apk-controller run --script tor.yaml
/// ```
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    // A subscriber may already be installed (tests, embedding binaries).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

pub fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
