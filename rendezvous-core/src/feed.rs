//! Publish the newest recommendation list to its observers.
//!
//! A refresh runs one fetch and merge cycle. Refreshes are not cancelled when
//! a newer one starts, so each takes a generation number and only the newest
//! generation may publish. A [`CancellationToken`] tied to the consumer's
//! lifetime aborts a refresh without touching state. The token is checked at
//! every step of a refresh, including before it takes a generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    BackendError, FetchOutcome, MergedRecommendations, RecommendationBackend,
    RecommendationFetcher, RecommendationQuery, merge_recommendations,
};

/// What a call to [`RecommendationFeed::refresh`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new list was published.
    Published {
        /// Generation of the published list.
        generation: u64,
        /// Number of recommended events.
        count: usize,
    },
    /// The region filter was empty; nothing was fetched or published.
    Skipped,
    /// A newer refresh started first; this result was discarded.
    Superseded {
        /// Generation of the discarded refresh.
        generation: u64,
    },
    /// The cancellation token fired before the refresh finished.
    Cancelled,
    /// The recommendation request failed; an empty list was published.
    Failed {
        /// Generation of the failed refresh.
        generation: u64,
        /// Backend failure.
        error: BackendError,
    },
}

/// Holds the current recommendation list and refreshes it on demand.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use rendezvous_core::{
///     BackendError, CONTENT_BASED, EventId, EventRecord, RecommendationBackend,
///     RecommendationFeed, RecommendationFetcher, RecommendationQuery,
///     RecommendationResponse, RefreshOutcome, RegionFilter, StrategyEntry, StrategyResult,
/// };
/// use tokio_util::sync::CancellationToken;
///
/// struct Picnic;
///
/// #[async_trait]
/// impl RecommendationBackend for Picnic {
///     async fn recommended_events(
///         &self,
///         _query: &RecommendationQuery,
///     ) -> Result<RecommendationResponse, BackendError> {
///         Ok(RecommendationResponse::new(vec![StrategyResult::new(
///             CONTENT_BASED,
///             vec![StrategyEntry::new("7", 0.8)],
///         )]))
///     }
///
///     async fn event_by_id(&self, id: &EventId) -> Result<Option<EventRecord>, BackendError> {
///         Ok(Some(EventRecord::new(id.clone(), "Picnic")))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let feed = RecommendationFeed::new(RecommendationFetcher::new(Picnic));
/// let query = RecommendationQuery::new("u1", 20, RegionFilter::new(["north"]))?;
///
/// let outcome = feed.refresh(&query, &CancellationToken::new()).await;
///
/// assert_eq!(outcome, RefreshOutcome::Published { generation: 1, count: 1 });
/// assert_eq!(feed.current().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RecommendationFeed<B> {
    fetcher: RecommendationFetcher<B>,
    generation: AtomicU64,
    sender: watch::Sender<Arc<MergedRecommendations>>,
}

impl<B> RecommendationFeed<B>
where
    B: RecommendationBackend,
{
    /// Create a feed with an empty list.
    #[must_use]
    pub fn new(fetcher: RecommendationFetcher<B>) -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(MergedRecommendations::default()));
        Self {
            fetcher,
            generation: AtomicU64::new(0),
            sender,
        }
    }

    /// Observe published lists.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<MergedRecommendations>> {
        self.sender.subscribe()
    }

    /// The most recently published list.
    #[must_use]
    pub fn current(&self) -> Arc<MergedRecommendations> {
        Arc::clone(&self.sender.borrow())
    }

    /// Generation of the newest refresh started so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Borrow the underlying fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &RecommendationFetcher<B> {
        &self.fetcher
    }

    /// Run one fetch and merge cycle for `query`.
    ///
    /// The list is rebuilt from scratch. Errors never escape: a failed
    /// recommendation request publishes an empty list and is reported through
    /// [`RefreshOutcome::Failed`].
    pub async fn refresh(
        &self,
        query: &RecommendationQuery,
        cancel: &CancellationToken,
    ) -> RefreshOutcome {
        if query.regions().is_empty() {
            debug!("region filter is empty; keeping current recommendations");
            return RefreshOutcome::Skipped;
        }
        // A refresh cancelled before it starts must not invalidate one in flight.
        if cancel.is_cancelled() {
            debug!("recommendation refresh cancelled before start");
            return RefreshOutcome::Cancelled;
        }
        let generation = self.begin_generation();

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("recommendation refresh {generation} cancelled while fetching");
                return RefreshOutcome::Cancelled;
            }
            result = self.fetcher.fetch(query) => result,
        };
        if cancel.is_cancelled() {
            debug!("recommendation refresh {generation} cancelled before publishing");
            return RefreshOutcome::Cancelled;
        }

        if !self.is_current(generation) {
            debug!("discarding recommendations from superseded refresh {generation}");
            return RefreshOutcome::Superseded { generation };
        }

        match fetched {
            Ok(FetchOutcome::Fetched(candidates)) => {
                let merged = merge_recommendations(candidates);
                let count = merged.len();
                self.sender.send_replace(Arc::new(merged));
                RefreshOutcome::Published { generation, count }
            }
            Ok(FetchOutcome::Skipped) => RefreshOutcome::Skipped,
            Err(error) => {
                warn!("recommendation refresh {generation} failed: {error}");
                self.sender
                    .send_replace(Arc::new(MergedRecommendations::default()));
                RefreshOutcome::Failed { generation, error }
            }
        }
    }

    /// Drop the current list and invalidate in-flight refreshes.
    ///
    /// Call on logout or when the consumer goes away.
    pub fn clear(&self) {
        self.begin_generation();
        self.sender
            .send_replace(Arc::new(MergedRecommendations::default()));
    }

    fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubBackend;
    use crate::{
        COLLABORATIVE_FILTERING, CONTENT_BASED, EventRecord, RecommendationResponse,
        RegionFilter, StrategyEntry, StrategyResult,
    };
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn query() -> RecommendationQuery {
        RecommendationQuery::new("u1", 20, RegionFilter::new(["north", "south"]))
            .expect("valid query")
    }

    fn backend() -> StubBackend {
        StubBackend::with_response(RecommendationResponse::new(vec![
            StrategyResult::new(
                CONTENT_BASED,
                vec![StrategyEntry::new("1", 0.4), StrategyEntry::new("2", 0.9)],
            ),
            StrategyResult::new(COLLABORATIVE_FILTERING, vec![StrategyEntry::new(1_u64, 1.0)]),
        ]))
        .with_event(EventRecord::new(1_u64, "Hike"))
        .with_event(EventRecord::new(2_u64, "Quiz night"))
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_publishes_ranked_list(query: RecommendationQuery) {
        let feed = RecommendationFeed::new(RecommendationFetcher::new(backend()));
        let mut receiver = feed.subscribe();

        let outcome = feed.refresh(&query, &CancellationToken::new()).await;

        assert_eq!(
            outcome,
            RefreshOutcome::Published {
                generation: 1,
                count: 2
            }
        );
        assert!(receiver.has_changed().expect("sender alive"));
        let published = receiver.borrow_and_update().clone();
        let ids: Vec<&str> = published.iter().map(|e| e.event.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_regions_leave_state_untouched(query: RecommendationQuery) {
        let feed = RecommendationFeed::new(RecommendationFetcher::new(backend()));
        feed.refresh(&query, &CancellationToken::new()).await;
        let before = feed.current();
        let empty = RecommendationQuery::new("u1", 20, RegionFilter::default()).expect("query");

        let outcome = feed.refresh(&empty, &CancellationToken::new()).await;

        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(feed.current(), before);
        assert_eq!(feed.generation(), 1);
        assert_eq!(feed.fetcher().backend().recommendation_calls(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn cancelled_refresh_publishes_nothing(query: RecommendationQuery) {
        let feed = RecommendationFeed::new(RecommendationFetcher::new(backend()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = feed.refresh(&query, &cancel).await;

        assert_eq!(outcome, RefreshOutcome::Cancelled);
        assert!(feed.current().is_empty());
        assert_eq!(feed.generation(), 0);
        assert_eq!(feed.fetcher().backend().recommendation_calls(), 0);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cancelling_mid_fetch_keeps_the_published_list(query: RecommendationQuery) {
        let slow = backend().with_delay("1", Duration::from_millis(100));
        let feed = RecommendationFeed::new(RecommendationFetcher::new(slow));
        feed.refresh(&query, &CancellationToken::new()).await;
        let before = feed.current();
        let cancel = CancellationToken::new();

        let (outcome, ()) = tokio::join!(feed.refresh(&query, &cancel), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        assert_eq!(outcome, RefreshOutcome::Cancelled);
        assert_eq!(feed.current(), before);
        assert_eq!(feed.generation(), 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_refresh_leaves_in_flight_refresh_current(query: RecommendationQuery) {
        let slow = backend().with_delay("1", Duration::from_millis(50));
        let feed = RecommendationFeed::new(RecommendationFetcher::new(slow));
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let live_token = CancellationToken::new();

        let (live, dead) = tokio::join!(
            feed.refresh(&query, &live_token),
            feed.refresh(&query, &cancelled)
        );

        assert_eq!(dead, RefreshOutcome::Cancelled);
        assert_eq!(
            live,
            RefreshOutcome::Published {
                generation: 1,
                count: 2
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn failure_publishes_empty_list(query: RecommendationQuery) {
        let error = BackendError::Timeout {
            url: "http://backend.test/recommendations/events".to_owned(),
            timeout_secs: 30,
        };
        let feed = RecommendationFeed::new(RecommendationFetcher::new(StubBackend::with_error(
            error.clone(),
        )));

        let outcome = feed.refresh(&query, &CancellationToken::new()).await;

        assert_eq!(
            outcome,
            RefreshOutcome::Failed {
                generation: 1,
                error
            }
        );
        assert!(feed.current().is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn stale_refresh_is_discarded(query: RecommendationQuery) {
        let slow = backend().with_delay("1", Duration::from_millis(100));
        let feed = RecommendationFeed::new(RecommendationFetcher::new(slow));
        let cancel = CancellationToken::new();

        let (first, second) = tokio::join!(feed.refresh(&query, &cancel), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            feed.clear();
            feed.generation()
        });

        assert_eq!(first, RefreshOutcome::Superseded { generation: 1 });
        assert_eq!(second, 2);
        assert!(feed.current().is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn newest_refresh_wins_when_older_finishes_last(query: RecommendationQuery) {
        let slow = backend().with_delay("1", Duration::from_millis(100));
        let feed = RecommendationFeed::new(RecommendationFetcher::new(slow));
        let cancel = CancellationToken::new();

        let (older, newer) = tokio::join!(feed.refresh(&query, &cancel), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            feed.refresh(&query, &cancel).await
        });

        assert_eq!(older, RefreshOutcome::Superseded { generation: 1 });
        assert_eq!(
            newer,
            RefreshOutcome::Published {
                generation: 2,
                count: 2
            }
        );
        assert_eq!(feed.current().len(), 2);
    }
}
