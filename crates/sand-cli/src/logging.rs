//! Tracing setup for the `sandtool` binary.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "sand=info";
const VERBOSE_LOG_FILTER: &str = "sand=debug";

/// Filter for stderr output: `--verbose` wins, then `RUST_LOG`, then the default
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_LOG_FILTER);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber writing to stderr
///
/// # Errors
/// Fails if a global subscriber is already installed
pub fn init_logging(verbose: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter(verbose)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")
}
