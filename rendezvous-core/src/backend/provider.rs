//! Backend trait consumed by the recommendation fetcher.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{EventId, EventRecord, RecommendationQuery, RecommendationResponse};

use super::error::BackendError;

/// Remote operations the recommendation cycle depends on.
///
/// Implementations must be shareable across tasks: the fetcher issues
/// hydration requests concurrently against the same backend.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use rendezvous_core::{
///     BackendError, EventId, EventRecord, RecommendationBackend, RecommendationQuery,
///     RecommendationResponse,
/// };
///
/// struct EmptyBackend;
///
/// #[async_trait]
/// impl RecommendationBackend for EmptyBackend {
///     async fn recommended_events(
///         &self,
///         _query: &RecommendationQuery,
///     ) -> Result<RecommendationResponse, BackendError> {
///         Ok(RecommendationResponse::default())
///     }
///
///     async fn event_by_id(&self, _id: &EventId) -> Result<Option<EventRecord>, BackendError> {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Fetch scored candidates for `query`, grouped by strategy.
    async fn recommended_events(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationResponse, BackendError>;

    /// Fetch a full event record.
    ///
    /// Returns `Ok(None)` when the event no longer exists.
    async fn event_by_id(&self, id: &EventId) -> Result<Option<EventRecord>, BackendError>;
}

#[async_trait]
impl<T: RecommendationBackend + ?Sized> RecommendationBackend for Box<T> {
    async fn recommended_events(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationResponse, BackendError> {
        (**self).recommended_events(query).await
    }

    async fn event_by_id(&self, id: &EventId) -> Result<Option<EventRecord>, BackendError> {
        (**self).event_by_id(id).await
    }
}

#[async_trait]
impl<T: RecommendationBackend + ?Sized> RecommendationBackend for Arc<T> {
    async fn recommended_events(
        &self,
        query: &RecommendationQuery,
    ) -> Result<RecommendationResponse, BackendError> {
        (**self).recommended_events(query).await
    }

    async fn event_by_id(&self, id: &EventId) -> Result<Option<EventRecord>, BackendError> {
        (**self).event_by_id(id).await
    }
}
