//! `reqwest` client for the platform API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use rendezvous_core::{
    BackendError, EventId, EventRecord, RecommendationBackend, RecommendationQuery,
    RecommendationResponse,
};
use url::Url;

use super::wire::RecommendationsBody;

/// Error type for [`HttpBackend`] construction failures.
#[derive(Debug)]
pub enum BackendBuildError {
    /// The base URL could not be parsed or cannot carry a path.
    InvalidBaseUrl {
        /// Configured base URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
}

impl std::fmt::Display for BackendBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBaseUrl { url, message } => {
                write!(f, "invalid backend base URL {url:?}: {message}")
            }
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
        }
    }
}

impl std::error::Error for BackendBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBaseUrl { .. } => None,
            Self::HttpClient(err) => Some(err),
        }
    }
}

/// Default base URL of the platform API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default user agent for backend requests.
pub const DEFAULT_USER_AGENT: &str = "rendezvous-client/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpBackend`].
#[derive(Clone)]
pub struct HttpBackendConfig {
    /// Base URL of the platform API (e.g., `"https://api.example.com"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Bearer token of the signed-in session, if any.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for HttpBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackendConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            bearer_token: None,
        }
    }
}

impl HttpBackendConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Authenticate requests with `token`.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Platform API client implementing [`RecommendationBackend`].
///
/// The client is cheap to share: `reqwest::Client` pools connections
/// internally, so one instance should serve every hydration call of a
/// refresh.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    config: HttpBackendConfig,
}

impl HttpBackend {
    /// Create a backend with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendBuildError> {
        Self::with_config(HttpBackendConfig::new(base_url))
    }

    /// Create a backend with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: HttpBackendConfig) -> Result<Self, BackendBuildError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(BackendBuildError::HttpClient)?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Borrow the configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    /// Append `segments` to the base URL path.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{base}/recommendations/events?userId=..&limit=..&regions=a,b`
    fn recommendations_url(&self, query: &RecommendationQuery) -> Url {
        let mut url = self.endpoint(&["recommendations", "events"]);
        url.query_pairs_mut()
            .append_pair("userId", query.user_id())
            .append_pair("limit", &query.max_results().to_string())
            .append_pair("regions", &query.regions().as_slice().join(","));
        url
    }

    /// `{base}/events/{id}`, with the id percent-encoded as one segment.
    fn event_url(&self, id: &EventId) -> Url {
        self.endpoint(&["events", id.as_str()])
    }

    fn get(&self, url: &Url) -> RequestBuilder {
        let request = self.client.get(url.clone());
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Convert a reqwest error to a `BackendError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> BackendError {
        if error.is_timeout() {
            return BackendError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return BackendError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_decode() {
            return BackendError::Parse {
                url: url.to_string(),
                message: error.to_string(),
            };
        }

        BackendError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BackendBuildError> {
    let url = Url::parse(raw).map_err(|err| BackendBuildError::InvalidBaseUrl {
        url: raw.to_owned(),
        message: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BackendBuildError::InvalidBaseUrl {
            url: raw.to_owned(),
            message: "URL cannot carry a path".to_owned(),
        });
    }
    Ok(url)
}

#[async_trait]
impl RecommendationBackend for HttpBackend {
    async fn recommended_events(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationResponse, BackendError> {
        let url = self.recommendations_url(query);
        debug!("requesting recommendations from {url}");

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let body: Option<RecommendationsBody> = response
            .json()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        Ok(body.unwrap_or_default().into_response())
    }

    async fn event_by_id(&self, id: &EventId) -> Result<Option<EventRecord>, BackendError> {
        let url = self.event_url(id);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = response
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice::<Option<EventRecord>>(&bytes).map_err(|err| BackendError::Parse {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}
