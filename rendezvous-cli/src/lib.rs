//! Command-line interface for the Rendezvous events client.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod recommend;
mod session;

pub use error::CliError;

use recommend::{DefaultBackendBuilder, RecommendArgs};
use session::{LoginArgs, LogoutArgs};

const ARG_USER_ID: &str = "user-id";
const ARG_REGIONS: &str = "regions";
const ARG_MAX_RESULTS: &str = "max-results";
const ARG_BASE_URL: &str = "base-url";
const ARG_SESSION_FILE: &str = "session-file";
const ARG_CONCURRENCY: &str = "concurrency";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_ACCESS_TOKEN: &str = "access-token";
const ARG_DISPLAY_NAME: &str = "display-name";
const ENV_RECOMMEND_USER_ID: &str = "RENDEZVOUS_CMDS_RECOMMEND_USER_ID";
const ENV_LOGIN_USER_ID: &str = "RENDEZVOUS_CMDS_LOGIN_USER_ID";
const ENV_LOGIN_ACCESS_TOKEN: &str = "RENDEZVOUS_CMDS_LOGIN_ACCESS_TOKEN";

/// Session file used when none is configured.
const DEFAULT_SESSION_FILE: &str = ".rendezvous/session.json";

/// Run the Rendezvous CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Recommend(args) => {
            recommend::run_recommend_with(args, &DefaultBackendBuilder, &mut stdout)
        }
        Command::Login(args) => session::run_login_with(args, &mut stdout),
        Command::Logout(args) => session::run_logout_with(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "rendezvous",
    about = "Browse recommended events on the Rendezvous platform",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch, merge and rank recommended events for a user.
    Recommend(RecommendArgs),
    /// Persist a session so later commands run as that user.
    Login(LoginArgs),
    /// Clear the persisted session.
    Logout(LogoutArgs),
}

#[cfg(test)]
mod tests;
