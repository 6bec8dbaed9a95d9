//! Facade crate for the Rendezvous event recommendation client.
//!
//! This crate re-exports the core domain types and, behind the `http`
//! feature, the HTTP backend and file-backed session store.

#![forbid(unsafe_code)]

pub use rendezvous_core::{
    BackendError, EventId, EventRecord, FetchOutcome, MergedRecommendations, QueryError,
    RecommendationBackend, RecommendationFeed, RecommendationFetcher, RecommendationQuery,
    RecommendationResponse, RefreshOutcome, RegionFilter, ScoredEvent, Session, SessionContext,
    SessionStore, SessionStoreError, StrategyKind, merge_recommendations,
};

#[cfg(feature = "http")]
pub use rendezvous_data::{FileSessionStore, HttpBackend, HttpBackendConfig};
