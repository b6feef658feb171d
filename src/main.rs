//! filepath CLI - Declarative directory hierarchy management
//!
//! Entry point for the filepath command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use filepath::cli::output::display_error;
use filepath::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = cli.output();
    if let Err(e) = cli.run() {
        display_error(&e, output);
        std::process::exit(1);
    }
}
