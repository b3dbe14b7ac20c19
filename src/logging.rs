//! Diagnostics go to stderr through `tracing`.
//!
//! `RUST_LOG` wins when set. Otherwise `--quiet` drops everything below
//! errors.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Later calls are no-ops.
pub fn init(quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("seqkit=error")
        } else {
            EnvFilter::new("seqkit=info")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
