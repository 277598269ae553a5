//! Tracing bootstrap for the binary.
//!
//! Diagnostics meant for the user (warnings, errors, usage) are written to
//! stderr directly. Tracing output is for debugging the tool itself and is
//! off unless `EXTSCAN_LOG` asks for it, e.g. `EXTSCAN_LOG=extscan_core=trace`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "EXTSCAN_LOG";

/// Installs the global subscriber. Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
