//! Logging initialisation shared by the binary and integration tests

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`
pub const LOG_ENV: &str = "TAXALINK_LOG";

/// Build the filter: TAXALINK_LOG, then RUST_LOG, then the configured level
pub fn build_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&level) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global fmt subscriber writing to stderr.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}
