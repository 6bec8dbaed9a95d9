//! `login` and `logout` commands.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rendezvous_core::{Session, SessionContext};
use rendezvous_data::FileSessionStore;
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ACCESS_TOKEN, ARG_DISPLAY_NAME, ARG_SESSION_FILE, ARG_USER_ID, CliError,
    DEFAULT_SESSION_FILE, ENV_LOGIN_ACCESS_TOKEN, ENV_LOGIN_USER_ID,
};

/// CLI arguments for the `login` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Store the user id and bearer token issued by the platform so \
                 that later commands authenticate as that user. Prefer the \
                 environment variable for the token to keep it out of shell \
                 history.",
    about = "Persist a session"
)]
#[ortho_config(prefix = "RENDEZVOUS")]
pub(crate) struct LoginArgs {
    /// Backend user identifier.
    #[arg(long = ARG_USER_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    /// Bearer token issued by the platform.
    #[arg(long = ARG_ACCESS_TOKEN, value_name = "token")]
    #[serde(default)]
    pub(crate) access_token: Option<String>,
    /// Name shown for the signed-in user.
    #[arg(long = ARG_DISPLAY_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    /// Path of the persisted session.
    #[arg(long = ARG_SESSION_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) session_file: Option<Utf8PathBuf>,
}

/// CLI arguments for the `logout` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Clear the persisted session")]
#[ortho_config(prefix = "RENDEZVOUS")]
pub(crate) struct LogoutArgs {
    /// Path of the persisted session.
    #[arg(long = ARG_SESSION_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) session_file: Option<Utf8PathBuf>,
}

/// Resolved `login` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoginConfig {
    pub(crate) session: Session,
    pub(crate) session_file: Utf8PathBuf,
}

impl TryFrom<LoginArgs> for LoginConfig {
    type Error = CliError;

    fn try_from(args: LoginArgs) -> Result<Self, Self::Error> {
        let user_id = args.user_id.ok_or(CliError::MissingArgument {
            field: ARG_USER_ID,
            env: ENV_LOGIN_USER_ID,
        })?;
        let access_token = args.access_token.ok_or(CliError::MissingArgument {
            field: ARG_ACCESS_TOKEN,
            env: ENV_LOGIN_ACCESS_TOKEN,
        })?;
        let mut session = Session::new(user_id, access_token)?;
        if let Some(name) = args.display_name {
            session = session.with_display_name(name);
        }
        Ok(Self {
            session,
            session_file: session_file_or_default(args.session_file),
        })
    }
}

fn session_file_or_default(path: Option<Utf8PathBuf>) -> Utf8PathBuf {
    path.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_SESSION_FILE))
}

pub(crate) fn run_login_with(args: LoginArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = LoginConfig::try_from(merged)?;
    let mut context = SessionContext::init(FileSessionStore::new(config.session_file))?;
    let user_id = config.session.user_id.clone();
    context.sign_in(config.session)?;
    writeln!(writer, "signed in as {user_id}").map_err(CliError::WriteOutput)
}

pub(crate) fn run_logout_with(args: LogoutArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = FileSessionStore::new(session_file_or_default(merged.session_file));
    let mut context = SessionContext::init(store)?;
    let message = match context.user_id() {
        Some(user_id) => format!("signed out {user_id}"),
        None => "no session to clear".to_owned(),
    };
    context.teardown()?;
    writeln!(writer, "{message}").map_err(CliError::WriteOutput)
}
