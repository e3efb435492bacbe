//! fwforge - Buildroot firmware build driver
//!
//! Entry point for the fwforge command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fwforge::cli::output::display_error;
use fwforge::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors fail
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose, cli.quiet);
    tracing::debug!("fwforge {}", fwforge::cli::long_version().replace('\n', ", "));

    if let Err(e) = cli.run().await {
        display_error(&e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flags
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
