//! Core domain types for the Rendezvous events client.
//!
//! The crate models the recommendation cycle that powers the home feed:
//! a [`RecommendationFetcher`] asks a [`RecommendationBackend`] for scored
//! candidates and hydrates them into [`EventRecord`] values,
//! [`merge_recommendations`] collapses the per-strategy candidates into a
//! ranked [`MergedRecommendations`] list, and a [`RecommendationFeed`] publishes
//! the newest list while discarding stale refreshes.
//!
//! Session state lives in an explicit [`SessionContext`] rather than a global.
//! Constructors return `Result` to surface invalid input early.

#![forbid(unsafe_code)]

pub mod backend;
mod event;
mod feed;
mod fetch;
mod merge;
mod query;
mod session;
mod strategy;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use backend::{BackendError, RecommendationBackend};
pub use event::{EventId, EventRecord};
pub use feed::{RecommendationFeed, RefreshOutcome};
pub use fetch::{
    DEFAULT_HYDRATION_CONCURRENCY, FetchOutcome, RecommendationFetcher, prune_unhydrated,
};
pub use merge::{HydratedCandidate, MergedRecommendations, ScoredEvent, merge_recommendations};
pub use query::{DEFAULT_MAX_RESULTS, QueryError, RecommendationQuery, RegionFilter};
pub use session::{Session, SessionContext, SessionError, SessionStore, SessionStoreError};
pub use strategy::{
    COLLABORATIVE_FILTERING, CONTENT_BASED, Candidate, RecommendationResponse, StrategyEntry,
    StrategyKind, StrategyResult,
};

#[cfg(test)]
mod tests;
