//! Behavioural coverage for refreshing the recommendation feed.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio_util::sync::CancellationToken;

use crate::test_support::StubBackend;
use crate::{
    COLLABORATIVE_FILTERING, CONTENT_BASED, EventId, EventRecord, MergedRecommendations,
    RecommendationFeed, RecommendationFetcher, RecommendationQuery, RecommendationResponse,
    RefreshOutcome, RegionFilter, StrategyEntry, StrategyResult,
};

#[derive(Debug, Default)]
struct FeedContext {
    backend: RefCell<Option<StubBackend>>,
    outcome: RefCell<Option<RefreshOutcome>>,
    published: RefCell<Option<Arc<MergedRecommendations>>>,
    recommendation_calls: RefCell<usize>,
}

impl FeedContext {
    fn install(&self, backend: StubBackend) {
        *self.backend.borrow_mut() = Some(backend);
    }

    fn refresh(&self, regions: RegionFilter) {
        let backend = self
            .backend
            .borrow_mut()
            .take()
            .unwrap_or_else(|| panic!("backend must be configured"));
        let feed = RecommendationFeed::new(RecommendationFetcher::new(backend));
        let query = RecommendationQuery::new("viewer", 20, regions)
            .unwrap_or_else(|err| panic!("query should be valid: {err}"));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|err| panic!("build test runtime: {err}"));

        let outcome = runtime.block_on(feed.refresh(&query, &CancellationToken::new()));

        *self.recommendation_calls.borrow_mut() = feed.fetcher().backend().recommendation_calls();
        *self.outcome.borrow_mut() = Some(outcome);
        *self.published.borrow_mut() = Some(feed.current());
    }

    fn published(&self) -> Arc<MergedRecommendations> {
        self.published
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("refresh must run first"))
    }

    fn score_of(&self, id: &str) -> Option<f64> {
        self.published()
            .get(&EventId::from(id))
            .unwrap_or_else(|| panic!("event {id} should be listed"))
            .similarity_score
    }
}

#[fixture]
fn feed_context() -> FeedContext {
    FeedContext::default()
}

fn strategy(name: &str, entries: Vec<StrategyEntry>) -> StrategyResult {
    StrategyResult::new(name, entries)
}

fn events(backend: StubBackend, ids: &[&str]) -> StubBackend {
    ids.iter().fold(backend, |stub, id| {
        stub.with_event(EventRecord::new(*id, format!("event {id}")))
    })
}

#[given("a backend proposing event 1 by content and by collaborative filtering")]
fn proposing_by_both(feed_context: &FeedContext) {
    let response = RecommendationResponse::new(vec![
        strategy(CONTENT_BASED, vec![StrategyEntry::new("1", 0.7)]),
        strategy(COLLABORATIVE_FILTERING, vec![StrategyEntry::new("1", 1.0)]),
    ]);
    feed_context.install(events(StubBackend::with_response(response), &["1"]));
}

#[given("a backend proposing event 1 by content with scores 0.9 then 0.4")]
fn proposing_twice_by_content(feed_context: &FeedContext) {
    let response = RecommendationResponse::new(vec![
        strategy(CONTENT_BASED, vec![StrategyEntry::new("1", 0.9)]),
        strategy("content_based", vec![StrategyEntry::new("1", 0.4)]),
    ]);
    feed_context.install(events(StubBackend::with_response(response), &["1"]));
}

#[given("a backend proposing event 1 by collaborative filtering with values 1 then 2")]
fn proposing_twice_by_collaboration(feed_context: &FeedContext) {
    let response = RecommendationResponse::new(vec![strategy(
        COLLABORATIVE_FILTERING,
        vec![StrategyEntry::new("1", 1.0), StrategyEntry::new("1", 2.0)],
    )]);
    feed_context.install(events(StubBackend::with_response(response), &["1"]));
}

#[given("a backend proposing events A, B and C where B no longer exists")]
fn proposing_with_deleted_event(feed_context: &FeedContext) {
    let response = RecommendationResponse::new(vec![strategy(
        CONTENT_BASED,
        vec![
            StrategyEntry::new("A", 0.2),
            StrategyEntry::new("B", 0.9),
            StrategyEntry::new("C", 0.6),
        ],
    )]);
    feed_context.install(events(StubBackend::with_response(response), &["A", "C"]));
}

#[given("a backend proposing events scored 0.5, unscored and 0.8")]
fn proposing_mixed_scores(feed_context: &FeedContext) {
    let response = RecommendationResponse::new(vec![
        strategy(CONTENT_BASED, vec![StrategyEntry::new("mid", 0.5)]),
        strategy(COLLABORATIVE_FILTERING, vec![StrategyEntry::new("unset", 3.0)]),
        strategy(CONTENT_BASED, vec![StrategyEntry::new("top", 0.8)]),
    ]);
    feed_context.install(events(
        StubBackend::with_response(response),
        &["mid", "unset", "top"],
    ));
}

#[when("I refresh recommendations for the north region")]
fn refresh_north(feed_context: &FeedContext) {
    feed_context.refresh(RegionFilter::new(["north"]));
}

#[when("I refresh recommendations with no regions selected")]
fn refresh_without_regions(feed_context: &FeedContext) {
    feed_context.refresh(RegionFilter::default());
}

#[then("event 1 appears exactly once with both signals")]
fn appears_once(feed_context: &FeedContext) {
    let published = feed_context.published();
    assert_eq!(published.len(), 1, "expected a single entry");
    let scored = published
        .get(&EventId::from("1"))
        .unwrap_or_else(|| panic!("event 1 should be listed"));
    assert_eq!(scored.similarity_score, Some(0.7));
    assert_eq!(scored.similar_user_count, 1.0);
}

#[then("event 1 keeps similarity score 0.9")]
fn keeps_first_score(feed_context: &FeedContext) {
    assert_eq!(feed_context.score_of("1"), Some(0.9));
}

#[then("event 1 reports a similar user count of 2")]
fn reports_last_count(feed_context: &FeedContext) {
    let published = feed_context.published();
    let scored = published
        .get(&EventId::from("1"))
        .unwrap_or_else(|| panic!("event 1 should be listed"));
    assert_eq!(scored.similar_user_count, 2.0);
}

#[then("only events A and C are listed with their own scores")]
fn only_hydrated_events(feed_context: &FeedContext) {
    let published = feed_context.published();
    let ids: Vec<&str> = published.iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A"]);
    assert_eq!(feed_context.score_of("A"), Some(0.2));
    assert_eq!(feed_context.score_of("C"), Some(0.6));
}

#[then("the events are ordered 0.8, 0.5 then unscored")]
fn ordered_by_score(feed_context: &FeedContext) {
    let published = feed_context.published();
    let scores: Vec<Option<f64>> = published.iter().map(|e| e.similarity_score).collect();
    assert_eq!(scores, vec![Some(0.8), Some(0.5), None]);
}

#[then("the backend is not contacted and nothing is published")]
fn nothing_fetched(feed_context: &FeedContext) {
    assert_eq!(*feed_context.recommendation_calls.borrow(), 0);
    assert_eq!(
        feed_context.outcome.borrow().as_ref(),
        Some(&RefreshOutcome::Skipped)
    );
    assert!(feed_context.published().is_empty());
}

macro_rules! register_scenario {
    ($fn_name:ident, $index:literal) => {
        #[scenario(path = "tests/features/recommendation_feed.feature", index = $index)]
        fn $fn_name(feed_context: FeedContext) {
            let _ = feed_context;
        }
    };
}

register_scenario!(duplicate_events_collapse, 0);
register_scenario!(first_content_score_wins, 1);
register_scenario!(collaborative_count_overwrites, 2);
register_scenario!(deleted_events_are_pruned, 3);
register_scenario!(events_sort_by_score, 4);
register_scenario!(empty_region_filter_skips_fetch, 5);
