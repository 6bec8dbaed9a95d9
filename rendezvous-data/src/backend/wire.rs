//! Response body of the recommendation endpoint.
//!
//! The body is a JSON object keyed by strategy name:
//!
//! ```json
//! {
//!   "content-based": [["12", 0.83], ["7", 0.41]],
//!   "collaborative-filtering": [[12, 3]]
//! }
//! ```
//!
//! Strategy order matters when merging, so the object is read key by key
//! rather than through a sorted map.

use std::fmt;

use rendezvous_core::{EventId, RecommendationResponse, StrategyEntry, StrategyResult};
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};

/// Decoded body of `GET /recommendations/events`.
#[derive(Debug, Default)]
pub(super) struct RecommendationsBody(RecommendationResponse);

impl RecommendationsBody {
    pub(super) fn into_response(self) -> RecommendationResponse {
        self.0
    }
}

impl<'de> Deserialize<'de> for RecommendationsBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(StrategiesVisitor)
    }
}

struct StrategiesVisitor;

impl<'de> Visitor<'de> for StrategiesVisitor {
    type Value = RecommendationsBody;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object mapping strategy names to event lists")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut strategies = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            // A strategy with nothing to propose may be sent as null.
            let entries = map
                .next_value::<Option<Vec<WireEntry>>>()?
                .unwrap_or_default()
                .into_iter()
                .map(WireEntry::into_entry)
                .collect();
            strategies.push(StrategyResult::new(name, entries));
        }
        Ok(RecommendationsBody(RecommendationResponse::new(strategies)))
    }
}

/// One proposed event in any of the shapes the service has used.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEntry {
    /// `["12", 0.83]` or `["12", null]`.
    Pair(EventId, Option<f64>),
    /// `["12"]`
    Single((EventId,)),
    /// `{"id": "12", "score": 0.83}`
    Object {
        id: EventId,
        #[serde(default)]
        score: Option<f64>,
    },
    /// `"12"`
    Bare(EventId),
}

impl WireEntry {
    fn into_entry(self) -> StrategyEntry {
        let (event_id, score) = match self {
            Self::Pair(id, score) | Self::Object { id, score } => (id, score),
            Self::Single((id,)) | Self::Bare(id) => (id, None),
        };
        StrategyEntry { event_id, score }
    }
}
