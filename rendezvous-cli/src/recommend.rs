//! Recommend command implementation for the Rendezvous CLI.

use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rendezvous_core::{
    DEFAULT_HYDRATION_CONCURRENCY, DEFAULT_MAX_RESULTS, MergedRecommendations,
    RecommendationBackend, RecommendationFeed, RecommendationFetcher, RecommendationQuery,
    RefreshOutcome, RegionFilter, SessionContext,
};
use rendezvous_data::{FileSessionStore, HttpBackend, HttpBackendConfig};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    ARG_BASE_URL, ARG_CONCURRENCY, ARG_MAX_RESULTS, ARG_REGIONS, ARG_SESSION_FILE,
    ARG_TIMEOUT_SECS, ARG_USER_ID, CliError, DEFAULT_SESSION_FILE, ENV_RECOMMEND_USER_ID,
};

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch recommended events for a user, hydrate each one, merge \
                 the per-strategy results and print the ranked list as JSON. \
                 The user and bearer token default to the signed-in session.",
    about = "Print ranked event recommendations"
)]
#[ortho_config(prefix = "RENDEZVOUS")]
pub(crate) struct RecommendArgs {
    /// User to recommend for; defaults to the signed-in user.
    #[arg(long = ARG_USER_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    /// Comma-separated regions to draw events from.
    #[arg(long = ARG_REGIONS, value_name = "a,b")]
    #[serde(default)]
    pub(crate) regions: Option<String>,
    /// Maximum number of events the backend should propose.
    #[arg(long = ARG_MAX_RESULTS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_results: Option<u32>,
    /// Base URL of the platform API (e.g. "https://api.example.com").
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Path of the persisted session.
    #[arg(long = ARG_SESSION_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) session_file: Option<Utf8PathBuf>,
    /// Maximum number of event lookups in flight.
    #[arg(long = ARG_CONCURRENCY, value_name = "count")]
    #[serde(default)]
    pub(crate) concurrency: Option<usize>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl RecommendArgs {
    pub(crate) fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecommendConfig {
    /// Explicit user; `None` falls back to the session.
    pub(crate) user_id: Option<String>,
    pub(crate) regions: RegionFilter,
    pub(crate) max_results: u32,
    pub(crate) base_url: String,
    pub(crate) session_file: Utf8PathBuf,
    pub(crate) concurrency: NonZeroUsize,
    pub(crate) timeout: Duration,
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let defaults = HttpBackendConfig::default();
        let max_results = match args.max_results {
            Some(0) => {
                return Err(CliError::InvalidArgument {
                    field: ARG_MAX_RESULTS,
                    message: "must be at least 1",
                });
            }
            Some(count) => count,
            None => DEFAULT_MAX_RESULTS,
        };
        let concurrency = match args.concurrency {
            Some(limit) => NonZeroUsize::new(limit).ok_or(CliError::InvalidArgument {
                field: ARG_CONCURRENCY,
                message: "must be at least 1",
            })?,
            None => NonZeroUsize::new(DEFAULT_HYDRATION_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        };
        let timeout = match args.timeout_secs {
            Some(0) => {
                return Err(CliError::InvalidArgument {
                    field: ARG_TIMEOUT_SECS,
                    message: "must be at least 1 second",
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };

        Ok(Self {
            user_id: args.user_id.filter(|id| !id.trim().is_empty()),
            regions: args
                .regions
                .as_deref()
                .map(RegionFilter::parse_list)
                .unwrap_or_default(),
            max_results,
            base_url: args.base_url.unwrap_or(defaults.base_url),
            session_file: args
                .session_file
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_SESSION_FILE)),
            concurrency,
            timeout,
        })
    }
}

/// Builds the backend for the current recommend invocation.
pub(crate) trait BackendBuilder {
    fn build(
        &self,
        config: &RecommendConfig,
        access_token: Option<&str>,
    ) -> Result<Box<dyn RecommendationBackend>, CliError>;
}

pub(crate) struct DefaultBackendBuilder;

impl BackendBuilder for DefaultBackendBuilder {
    fn build(
        &self,
        config: &RecommendConfig,
        access_token: Option<&str>,
    ) -> Result<Box<dyn RecommendationBackend>, CliError> {
        let mut backend_config =
            HttpBackendConfig::new(config.base_url.clone()).with_timeout(config.timeout);
        if let Some(token) = access_token {
            backend_config = backend_config.with_bearer_token(token);
        }
        let backend =
            HttpBackend::with_config(backend_config).map_err(|source| CliError::BuildBackend {
                base_url: config.base_url.clone(),
                source,
            })?;
        Ok(Box::new(backend))
    }
}

pub(crate) fn run_recommend_with(
    args: RecommendArgs,
    builder: &dyn BackendBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let recommendations = execute_recommend(&config, builder)?;
    write_recommendations(writer, &recommendations)
}

pub(crate) fn execute_recommend(
    config: &RecommendConfig,
    builder: &dyn BackendBuilder,
) -> Result<MergedRecommendations, CliError> {
    let context = SessionContext::init(FileSessionStore::new(config.session_file.clone()))?;
    let user_id = config
        .user_id
        .clone()
        .or_else(|| context.user_id().map(str::to_owned))
        .ok_or(CliError::MissingArgument {
            field: ARG_USER_ID,
            env: ENV_RECOMMEND_USER_ID,
        })?;
    let query = RecommendationQuery::new(user_id, config.max_results, config.regions.clone())?;
    if query.regions().is_empty() {
        warn!("no regions selected (set --{ARG_REGIONS}); nothing to recommend");
    }

    let backend = builder.build(config, context.access_token())?;
    let fetcher = RecommendationFetcher::new(backend).with_concurrency(config.concurrency);
    let feed = RecommendationFeed::new(fetcher);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let outcome = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = cancel_on_interrupt(cancel.clone());
        let outcome = feed.refresh(&query, &cancel).await;
        interrupt.abort();
        outcome
    });

    match outcome {
        RefreshOutcome::Published { count, .. } => {
            info!("ranked {count} recommended events for {}", query.user_id());
        }
        RefreshOutcome::Skipped => {}
        RefreshOutcome::Failed { error, .. } => return Err(CliError::Recommend(error)),
        RefreshOutcome::Cancelled | RefreshOutcome::Superseded { .. } => {
            return Err(CliError::Cancelled);
        }
    }
    Ok(feed.current().as_ref().clone())
}

/// Cancel `token` when the process receives Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling recommendation refresh");
            token.cancel();
        }
    })
}

fn write_recommendations(
    writer: &mut dyn Write,
    recommendations: &MergedRecommendations,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(recommendations)
        .map_err(CliError::SerialiseRecommendations)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RecommendConfig, CliError> {
    let merged = RecommendArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RecommendConfig::try_from(merged)
}
