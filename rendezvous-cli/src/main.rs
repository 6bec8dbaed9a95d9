//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use rendezvous_cli::CliError;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `rendezvous_core=debug`.
const LOG_ENV: &str = "RENDEZVOUS_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match rendezvous_cli::run() {
        Ok(()) => {}
        // Clap renders help, version and usage errors itself.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("rendezvous: {err}");
            std::process::exit(1);
        }
    }
}
