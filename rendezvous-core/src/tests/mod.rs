//! Property and behaviour coverage for the recommendation cycle.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::{EventRecord, HydratedCandidate, StrategyKind, merge_recommendations};

mod behaviour;

fn strategy_kind() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![
        Just(StrategyKind::ContentBased),
        Just(StrategyKind::CollaborativeFiltering),
        Just(StrategyKind::Other("popular".to_owned())),
    ]
}

fn candidate() -> impl Strategy<Value = HydratedCandidate> {
    (0_u64..12, proptest::option::of(0.0_f64..5.0), strategy_kind()).prop_map(
        |(id, score, strategy)| HydratedCandidate {
            event: EventRecord::new(id, format!("event {id}")),
            score,
            strategy,
        },
    )
}

proptest! {
    #[test]
    fn merged_ids_are_unique_and_complete(candidates in proptest::collection::vec(candidate(), 0..40)) {
        let expected: HashSet<String> = candidates
            .iter()
            .map(|c| c.event.id.to_string())
            .collect();

        let merged = merge_recommendations(candidates);

        let ids: Vec<String> = merged.iter().map(|e| e.event.id.to_string()).collect();
        let unique: HashSet<String> = ids.iter().cloned().collect();
        prop_assert_eq!(ids.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn merged_list_is_sorted_descending(candidates in proptest::collection::vec(candidate(), 0..40)) {
        let merged = merge_recommendations(candidates);

        let scores: Vec<f64> = merged.iter().map(crate::ScoredEvent::ranking_score).collect();
        prop_assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }
}
