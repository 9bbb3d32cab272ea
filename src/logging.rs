//! Tracing setup for the `shellcmd` binary.
//!
//! Log lines go to stderr so they never mix into the command/output panels
//! printed on stdout.

use tracing_subscriber::EnvFilter;

/// Picks the filter: `RUST_LOG` if set, else `debug` when verbose, else `warn`.
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "shell_commander=debug" } else { "warn" })
    })
}

pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
