//! Per-strategy recommendation results and their flattened candidates.

use std::fmt;

use crate::EventId;

/// Canonical name of the content-similarity strategy.
pub const CONTENT_BASED: &str = "content-based";

/// Canonical name of the collaborative-filtering strategy.
pub const COLLABORATIVE_FILTERING: &str = "collaborative-filtering";

/// Scoring method that proposed a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Similarity between the event and the user's past events.
    ContentBased,
    /// Events attended by users similar to the viewer.
    CollaborativeFiltering,
    /// Any strategy the client does not interpret.
    Other(String),
}

impl StrategyKind {
    /// Classify a backend strategy label.
    ///
    /// Matching ignores case and punctuation, so `content-based`,
    /// `content_based` and `contentBased` all map to
    /// [`StrategyKind::ContentBased`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rendezvous_core::StrategyKind;
    ///
    /// assert_eq!(StrategyKind::classify("contentBased"), StrategyKind::ContentBased);
    /// assert_eq!(
    ///     StrategyKind::classify("Collaborative_Filtering"),
    ///     StrategyKind::CollaborativeFiltering
    /// );
    /// assert_eq!(
    ///     StrategyKind::classify("trending"),
    ///     StrategyKind::Other("trending".to_owned())
    /// );
    /// ```
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let folded: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "contentbased" => Self::ContentBased,
            "collaborativefiltering" => Self::CollaborativeFiltering,
            _ => Self::Other(name.to_owned()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentBased => f.write_str(CONTENT_BASED),
            Self::CollaborativeFiltering => f.write_str(COLLABORATIVE_FILTERING),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// One `(event id, score)` pair proposed by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEntry {
    /// Proposed event.
    pub event_id: EventId,
    /// Strategy score; `None` when the backend omitted it.
    pub score: Option<f64>,
}

impl StrategyEntry {
    /// Build an entry with a score.
    #[must_use]
    pub fn new(event_id: impl Into<EventId>, score: f64) -> Self {
        Self {
            event_id: event_id.into(),
            score: Some(score),
        }
    }

    /// Build an entry whose score is missing.
    #[must_use]
    pub fn unscored(event_id: impl Into<EventId>) -> Self {
        Self {
            event_id: event_id.into(),
            score: None,
        }
    }
}

/// Ordered output of a single strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    /// Label as sent by the backend.
    pub name: String,
    /// Entries in backend order.
    pub entries: Vec<StrategyEntry>,
}

impl StrategyResult {
    /// Build a strategy result.
    #[must_use]
    pub fn new(name: impl Into<String>, entries: Vec<StrategyEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Classify this strategy's label.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        StrategyKind::classify(&self.name)
    }
}

/// A flattened candidate awaiting hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Event to hydrate.
    pub event_id: EventId,
    /// Score attached by the proposing strategy.
    pub score: Option<f64>,
    /// Strategy that proposed the event.
    pub strategy: StrategyKind,
}

/// Response of the recommendation endpoint: strategies in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationResponse {
    strategies: Vec<StrategyResult>,
}

impl RecommendationResponse {
    /// Wrap strategy results, keeping their order.
    #[must_use]
    pub const fn new(strategies: Vec<StrategyResult>) -> Self {
        Self { strategies }
    }

    /// Borrow the strategy results.
    #[must_use]
    pub fn strategies(&self) -> &[StrategyResult] {
        &self.strategies
    }

    /// Total number of entries across strategies.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.strategies.iter().map(|s| s.entries.len()).sum()
    }

    /// Flatten into candidates, concatenating strategies in order.
    ///
    /// The merge step depends on this order: the first content-based score
    /// seen for an event is the one that sticks.
    #[must_use]
    pub fn into_candidates(self) -> Vec<Candidate> {
        self.strategies
            .into_iter()
            .flat_map(|strategy| {
                let kind = strategy.kind();
                strategy
                    .entries
                    .into_iter()
                    .map(move |entry| Candidate {
                        event_id: entry.event_id,
                        score: entry.score,
                        strategy: kind.clone(),
                    })
            })
            .collect()
    }
}
