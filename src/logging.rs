//! Tracing setup.
//!
//! Storage and cache failures are logged only; there is no user-facing
//! error surface for them, so the log is where they land.

use std::io;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Use the RUST_LOG env var to control the log level (e.g. RUST_LOG=debug);
/// the default is `warn`, which still captures failed commits and cache
/// degradations.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}
