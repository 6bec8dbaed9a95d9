//! Fetch recommended candidates and hydrate them into full event records.

use std::num::NonZeroUsize;

use futures_util::stream::{self, StreamExt};
use log::{debug, warn};

use crate::{
    BackendError, Candidate, EventId, EventRecord, HydratedCandidate, RecommendationBackend,
    RecommendationQuery,
};

/// Hydration requests allowed in flight when no limit is configured.
pub const DEFAULT_HYDRATION_CONCURRENCY: usize = 8;

/// Result of a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The region filter was empty; the backend was not contacted.
    Skipped,
    /// Hydrated candidates in flattened strategy order.
    Fetched(Vec<HydratedCandidate>),
}

/// Requests scored candidates and resolves each id into its event record.
///
/// Hydration requests run concurrently, bounded by the configured limit, and
/// their results keep the flattened candidate order.
#[derive(Debug)]
pub struct RecommendationFetcher<B> {
    backend: B,
    concurrency: NonZeroUsize,
}

impl<B> RecommendationFetcher<B>
where
    B: RecommendationBackend,
{
    /// Create a fetcher using [`DEFAULT_HYDRATION_CONCURRENCY`].
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            concurrency: NonZeroUsize::new(DEFAULT_HYDRATION_CONCURRENCY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Cap the number of hydration requests in flight.
    #[must_use]
    pub const fn with_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Borrow the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch and hydrate candidates for `query`.
    ///
    /// An empty region filter short-circuits to [`FetchOutcome::Skipped`]
    /// without contacting the backend. Candidates whose record is missing, or
    /// whose hydration request fails, are dropped together with their score
    /// and strategy.
    ///
    /// # Errors
    /// Returns the backend error when the recommendation request itself
    /// fails.
    pub async fn fetch(&self, query: &RecommendationQuery) -> Result<FetchOutcome, BackendError> {
        if query.regions().is_empty() {
            debug!(
                "skipping recommendations for user {}: no regions selected",
                query.user_id()
            );
            return Ok(FetchOutcome::Skipped);
        }

        let response = self.backend.recommended_events(query).await?;
        let candidates = response.into_candidates();
        debug!(
            "hydrating {} recommendation candidates for user {}",
            candidates.len(),
            query.user_id()
        );
        let records = self.hydrate(&candidates).await;
        Ok(FetchOutcome::Fetched(prune_unhydrated(candidates, records)))
    }

    async fn hydrate(&self, candidates: &[Candidate]) -> Vec<Option<EventRecord>> {
        stream::iter(
            candidates
                .iter()
                .map(|candidate| self.hydrate_one(&candidate.event_id)),
        )
        .buffered(self.concurrency.get())
        .collect()
        .await
    }

    async fn hydrate_one(&self, id: &EventId) -> Option<EventRecord> {
        match self.backend.event_by_id(id).await {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!("event {id} no longer exists; dropping candidate");
                None
            }
            Err(err) => {
                warn!("failed to hydrate event {id}: {err}");
                None
            }
        }
    }
}

/// Pair candidates with their hydrated records, dropping unresolved ones.
///
/// `records` is aligned by index with `candidates`. A missing record removes
/// its candidate's score and strategy too, so later candidates keep their own
/// signals. Surplus entries on either side are ignored.
///
/// # Examples
///
/// ```
/// use rendezvous_core::{Candidate, EventRecord, StrategyKind, prune_unhydrated};
///
/// let candidate = |id: &str, score| Candidate {
///     event_id: id.into(),
///     score: Some(score),
///     strategy: StrategyKind::ContentBased,
/// };
/// let hydrated = prune_unhydrated(
///     vec![candidate("a", 0.1), candidate("b", 0.2), candidate("c", 0.3)],
///     vec![Some(EventRecord::new("a", "A")), None, Some(EventRecord::new("c", "C"))],
/// );
///
/// assert_eq!(hydrated.len(), 2);
/// assert_eq!(hydrated[1].event.id.as_str(), "c");
/// assert_eq!(hydrated[1].score, Some(0.3));
/// ```
#[must_use]
pub fn prune_unhydrated(
    candidates: Vec<Candidate>,
    records: Vec<Option<EventRecord>>,
) -> Vec<HydratedCandidate> {
    candidates
        .into_iter()
        .zip(records)
        .filter_map(|(candidate, record)| {
            record.map(|event| HydratedCandidate {
                event,
                score: candidate.score,
                strategy: candidate.strategy,
            })
        })
        .collect()
}
