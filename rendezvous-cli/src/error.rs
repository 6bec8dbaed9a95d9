//! Error types emitted by the Rendezvous CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use rendezvous_core::{BackendError, QueryError, SessionError, SessionStoreError};
use rendezvous_data::BackendBuildError;
use thiserror::Error;

/// Errors emitted by the Rendezvous CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option holds a value outside its accepted range.
    #[error("invalid {field}: {message}")]
    InvalidArgument {
        field: &'static str,
        message: &'static str,
    },
    /// The recommendation query failed validation.
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    /// The supplied credentials failed validation.
    #[error(transparent)]
    InvalidSession(#[from] SessionError),
    /// Reading or writing the persisted session failed.
    #[error(transparent)]
    SessionStore(#[from] SessionStoreError),
    /// Constructing the HTTP backend failed.
    #[error("failed to build backend client for {base_url:?}: {source}")]
    BuildBackend {
        base_url: String,
        #[source]
        source: BackendBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The recommendation request failed.
    #[error("failed to fetch recommendations: {0}")]
    Recommend(#[source] BackendError),
    /// The refresh was interrupted before it finished.
    #[error("recommendation refresh was cancelled")]
    Cancelled,
    /// Serialising the recommendation list failed.
    #[error("failed to serialise recommendations: {0}")]
    SerialiseRecommendations(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
