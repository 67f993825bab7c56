//! Logging setup

use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter};

/// Install a stdout subscriber, `info` by default, overridable via `RUST_LOG`.
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init_logging() -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}
