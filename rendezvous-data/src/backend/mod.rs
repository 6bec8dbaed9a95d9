//! HTTP implementation of [`rendezvous_core::RecommendationBackend`].
//!
//! Two endpoints are used:
//!
//! - `GET {base}/recommendations/events` returns, per strategy, the ordered
//!   `(event id, score)` pairs proposed for a user.
//! - `GET {base}/events/{id}` returns one event record, or `404` once the
//!   event has been deleted.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use rendezvous_core::{RecommendationFeed, RecommendationFetcher};
//! use rendezvous_data::{HttpBackend, HttpBackendConfig};
//!
//! let config = HttpBackendConfig::new("https://api.example.com")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_bearer_token("token");
//! let backend = HttpBackend::with_config(config)?;
//! let feed = RecommendationFeed::new(RecommendationFetcher::new(backend));
//! # let _ = feed;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod wire;

pub use client::{
    BackendBuildError, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpBackend, HttpBackendConfig,
};
