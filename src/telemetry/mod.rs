//! Telemetry setup for LearnOS Buddy
//!
//! Installs a `tracing` subscriber on stderr so diagnostic logs never mix
//! with the streamed answer on stdout.

use tracing_subscriber::EnvFilter;

use crate::cli::Verbosity;

/// Filter directive used when RUST_LOG is not set
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "learnos_buddy=info,warn",
        Verbosity::VeryVerbose => "learnos_buddy=debug,info",
    }
}

/// Install the global subscriber
///
/// RUST_LOG takes precedence over the verbosity flags. Calling this twice
/// is harmless; the second call is ignored.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
