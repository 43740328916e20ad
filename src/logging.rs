//! Tracing subscriber setup for binaries and tests embedding this crate

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global subscriber filtered by `RUST_LOG` (default `info`)
///
/// Returns an error instead of panicking when a subscriber is already set.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
