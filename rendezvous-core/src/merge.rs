//! Merge per-strategy candidates into one ranked recommendation list.
//!
//! Strategies propose events independently, so the same event can arrive
//! several times with different signals. [`merge_recommendations`] collapses
//! duplicates into a single [`ScoredEvent`] and orders the result by
//! descending similarity score.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::{EventId, EventRecord, StrategyKind};

/// A hydrated candidate: the full record plus the strategy signal that
/// proposed it.
#[derive(Debug, Clone, PartialEq)]
pub struct HydratedCandidate {
    /// Full event record.
    pub event: EventRecord,
    /// Strategy score; `None` when the backend omitted it.
    pub score: Option<f64>,
    /// Strategy that proposed the event.
    pub strategy: StrategyKind,
}

/// An event annotated with combined recommendation signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEvent {
    /// The underlying record.
    #[serde(flatten)]
    pub event: EventRecord,
    /// Content-similarity score, present only when a content-based strategy
    /// proposed the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    /// Similar-user signal from collaborative filtering; zero otherwise.
    ///
    /// Starts at `1.0` on the first collaborative occurrence and then holds
    /// the score of the latest duplicate verbatim.
    pub similar_user_count: f64,
}

impl ScoredEvent {
    /// Score used for ordering: the similarity score, or `0.0` when unset or
    /// not finite.
    #[must_use]
    pub fn ranking_score(&self) -> f64 {
        self.similarity_score
            .filter(|score| score.is_finite())
            .unwrap_or(0.0)
    }

    fn from_candidate(candidate: HydratedCandidate) -> Self {
        let HydratedCandidate {
            event,
            score,
            strategy,
        } = candidate;
        match strategy {
            StrategyKind::ContentBased => Self {
                event,
                similarity_score: score,
                similar_user_count: 0.0,
            },
            StrategyKind::CollaborativeFiltering => Self {
                event,
                similarity_score: None,
                similar_user_count: 1.0,
            },
            StrategyKind::Other(_) => Self {
                event,
                similarity_score: None,
                similar_user_count: 0.0,
            },
        }
    }

    fn absorb(&mut self, strategy: &StrategyKind, score: Option<f64>) {
        match strategy {
            StrategyKind::ContentBased => {
                if self.similarity_score.is_none() {
                    self.similarity_score = score;
                }
            }
            // Last value wins. Occurrences are not summed.
            StrategyKind::CollaborativeFiltering => {
                self.similar_user_count = user_signal(score);
            }
            StrategyKind::Other(_) => {}
        }
    }
}

/// Finite scores are kept as sent; a missing or non-finite score reads as
/// zero so the list stays serialisable.
fn user_signal(score: Option<f64>) -> f64 {
    score.filter(|value| value.is_finite()).unwrap_or(0.0)
}

/// Ranked recommendations, one entry per event id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedRecommendations {
    events: Vec<ScoredEvent>,
}

impl MergedRecommendations {
    /// Number of recommended events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Report whether nothing was recommended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Borrow the ranked events.
    #[must_use]
    pub fn as_slice(&self) -> &[ScoredEvent] {
        &self.events
    }

    /// Iterate over the ranked events.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredEvent> {
        self.events.iter()
    }

    /// Look up an event by id.
    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&ScoredEvent> {
        self.events.iter().find(|scored| &scored.event.id == id)
    }

    /// Consume the list and return the ranked events.
    #[must_use]
    pub fn into_inner(self) -> Vec<ScoredEvent> {
        self.events
    }
}

/// Collapse hydrated candidates into a ranked, duplicate-free list.
///
/// Candidates must arrive in flattened strategy order. For an event seen more
/// than once, the first content-based score wins and each
/// collaborative-filtering occurrence overwrites the similar-user count. The
/// result is sorted by descending [`ScoredEvent::ranking_score`]; ties keep
/// first-seen order.
///
/// # Examples
///
/// ```
/// use rendezvous_core::{EventRecord, HydratedCandidate, StrategyKind, merge_recommendations};
///
/// let candidate = |id: &str, score, strategy| HydratedCandidate {
///     event: EventRecord::new(id, id),
///     score: Some(score),
///     strategy,
/// };
/// let merged = merge_recommendations([
///     candidate("a", 0.4, StrategyKind::ContentBased),
///     candidate("b", 0.9, StrategyKind::ContentBased),
///     candidate("a", 1.0, StrategyKind::CollaborativeFiltering),
/// ]);
///
/// let ids: Vec<_> = merged.iter().map(|e| e.event.id.as_str()).collect();
/// assert_eq!(ids, ["b", "a"]);
/// assert_eq!(merged.as_slice()[1].similar_user_count, 1.0);
/// ```
pub fn merge_recommendations<I>(candidates: I) -> MergedRecommendations
where
    I: IntoIterator<Item = HydratedCandidate>,
{
    let mut events: Vec<ScoredEvent> = Vec::new();
    let mut positions: HashMap<EventId, usize> = HashMap::new();

    for candidate in candidates {
        let existing = positions
            .get(&candidate.event.id)
            .and_then(|&index| events.get_mut(index));
        if let Some(scored) = existing {
            scored.absorb(&candidate.strategy, candidate.score);
            continue;
        }
        positions.insert(candidate.event.id.clone(), events.len());
        events.push(ScoredEvent::from_candidate(candidate));
    }

    events.sort_by(|left, right| {
        right
            .ranking_score()
            .partial_cmp(&left.ranking_score())
            .unwrap_or(Ordering::Equal)
    });
    MergedRecommendations { events }
}
