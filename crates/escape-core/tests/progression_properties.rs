//! Property tests for stage progression and contribution recording.

use escape_core::progression::normalize_solved_stages;
use escape_core::{advance, record_contribution, AdvanceInput, SceneState};
use proptest::prelude::*;

fn raw_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-5i32..40).prop_map(f64::from),
        (-5.0f64..40.0),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn advance_input() -> impl Strategy<Value = AdvanceInput> {
    (
        raw_number(),
        prop::collection::vec(raw_number(), 0..12),
        raw_number(),
        raw_number(),
        any::<bool>(),
    )
        .prop_map(|(current, solved, requested, total, explicit)| AdvanceInput {
            current_stage_index: current,
            solved_stages: solved,
            requested_next_stage_index: requested,
            total_rooms: total,
            explicit_complete: explicit,
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

    #[test]
    fn solved_stages_never_shrink(input in advance_input()) {
        let outcome = advance(&input);
        for stage in normalize_solved_stages(&input.solved_stages) {
            prop_assert!(outcome.solved_stages.contains(&stage));
        }
    }

    #[test]
    fn solved_stages_strictly_ascending(input in advance_input()) {
        let outcome = advance(&input);
        prop_assert!(outcome.solved_stages.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(outcome.solved_stages.iter().all(|s| *s >= 1));
        prop_assert!(outcome.next_stage_index >= 1);
    }

    #[test]
    fn advance_is_deterministic(input in advance_input()) {
        prop_assert_eq!(advance(&input), advance(&input));
    }

    #[test]
    fn completion_caps_at_total(input in advance_input()) {
        let outcome = advance(&input);
        let total = if input.total_rooms.is_finite() && input.total_rooms >= 1.0 {
            input.total_rooms.floor() as u32
        } else {
            0
        };
        if outcome.is_complete && total > 0 {
            prop_assert_eq!(outcome.next_stage_index, total);
            prop_assert!(outcome.solved_stages.contains(&total));
        }
    }

    #[test]
    fn recorded_counts_add_up(stage in -3i32..6, calls in 1usize..8) {
        let mut scene = SceneState::new();
        for _ in 0..calls {
            scene = record_contribution(&scene, f64::from(stage), "u1", None);
        }
        let normalized = (stage.max(1)) as u32;
        prop_assert_eq!(scene.ledger().count(normalized, "u1") as usize, calls);
    }
}
