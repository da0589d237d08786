//! Logging initialization for the clearance CLI.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `ClearanceConfig`. Log lines go to stderr so that JSON output on stdout
//! stays machine-readable.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use clearance_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called once, before any tracing macros are used. `RUST_LOG`
/// takes precedence over `log_level`.
///
/// # Formats
///
/// * `"json"` - JSON lines
/// * `"pretty"` - human-readable colored output
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize JSON tracing subscriber: {e}"))?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize pretty tracing subscriber: {e}")
                })?;
        }
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ));
        }
    }

    Ok(())
}
