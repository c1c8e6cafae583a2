use crate::args::Cli;
use is_terminal::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the tracing subscriber for the lifetime of the process.
///
/// Snapshot lines go to stderr so they never mix with anything a pipeline
/// stage expects on stdout. `RUST_LOG` overrides the flag-derived level.
pub fn init(cli: &Cli) {
    let default_level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}
