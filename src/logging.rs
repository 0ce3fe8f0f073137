//! Logging setup.
//!
//! Logs go to stderr. `RUST_LOG` replaces the verbosity-derived filter.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `-q` keeps errors only; otherwise `-v` / `-vv` raise this crate and the
/// HTTP trace layer to `debug` / `trace`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,issue_tracker={level},tower_http={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

/// Subscriber for tests: output is captured per test, `debug` by default.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
