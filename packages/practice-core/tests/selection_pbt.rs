//! Property-based tests for calibration, prediction, selection and updates.
//!
//! Invariants covered:
//! - Calibrated difficulty always lands in [0.05, 0.95]
//! - Predicted success is bounded, monotone, and 0.5 at equal scores
//! - Selected item is never farther from the target than any other candidate
//! - Mastery stays clamped and per-skill counters stay consistent
//! - Achievement evaluation never duplicates an earned id

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use practice_core::achievements::evaluate_achievements;
use practice_core::calibration::difficulty_score;
use practice_core::progress::{apply_response, Response};
use practice_core::selection::{score_candidates, select_item};
use practice_core::{
    calibrate_difficulty, predict_success, DifficultyLabel, EngineConfig, Item, ItemStats,
    ItemStatsStore, Learner,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_f64_0_1() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_label() -> impl Strategy<Value = DifficultyLabel> {
    prop_oneof![
        Just(DifficultyLabel::Beginner),
        Just(DifficultyLabel::Intermediate),
        Just(DifficultyLabel::Advanced),
        Just(DifficultyLabel::Unknown),
    ]
}

fn arb_stats() -> impl Strategy<Value = Option<ItemStats>> {
    proptest::option::of((0u64..500, 0u64..500).prop_map(|(correct, incorrect)| ItemStats {
        attempts: correct + incorrect,
        correct,
        incorrect,
    }))
}

fn arb_candidates() -> impl Strategy<Value = Vec<(DifficultyLabel, u64, u64)>> {
    prop::collection::vec((arb_label(), 0u64..20, 0u64..20), 1..12)
}

fn build_candidates(profiles: &[(DifficultyLabel, u64, u64)], store: &ItemStatsStore) -> Vec<Item> {
    profiles
        .iter()
        .enumerate()
        .map(|(i, (label, correct, incorrect))| {
            let id = i as i64 + 1;
            for _ in 0..*correct {
                store.record(id, true);
            }
            for _ in 0..*incorrect {
                store.record(id, false);
            }
            Item {
                id,
                skill: "grammar".to_string(),
                difficulty: *label,
                level: 1,
                lesson: None,
                prompt: None,
                hints: Vec::new(),
                answer: "x".to_string(),
            }
        })
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_difficulty_in_bounds(label in arb_label(), stats in arb_stats()) {
        let score = difficulty_score(&EngineConfig::default(), label, stats);
        prop_assert!((0.05..=0.95).contains(&score), "score {} out of bounds", score);
    }

    #[test]
    fn prop_prediction_bounded_and_monotone(
        mastery in arb_f64_0_1(),
        difficulty in arb_f64_0_1(),
        delta in 0.001f64..0.5,
    ) {
        let p = predict_success(mastery, difficulty);
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!(predict_success(mastery + delta, difficulty) >= p);
        prop_assert!(predict_success(mastery, difficulty + delta) <= p);
        prop_assert_eq!(predict_success(mastery, mastery), 0.5);
    }

    #[test]
    fn prop_selected_item_is_closest(
        profiles in arb_candidates(),
        mastery in arb_f64_0_1(),
        target in arb_f64_0_1(),
        seed in any::<u64>(),
    ) {
        let config = EngineConfig::default();
        let store = ItemStatsStore::new();
        let candidates = build_candidates(&profiles, &store);
        let mut rng = StdRng::seed_from_u64(seed);

        let chosen = select_item(&config, &candidates, mastery, &store, target, &mut rng).unwrap();
        for other in score_candidates(&config, &candidates, mastery, &store, target) {
            prop_assert!(
                chosen.distance_to_target <= other.distance_to_target + config.tie_epsilon,
                "chose {} at {} but {} is at {}",
                chosen.item.id,
                chosen.distance_to_target,
                other.item.id,
                other.distance_to_target
            );
        }
    }

    #[test]
    fn prop_mastery_clamped_and_counters_consistent(
        start in arb_f64_0_1(),
        outcomes in prop::collection::vec((any::<bool>(), 0.0f64..120.0), 1..40),
    ) {
        let config = EngineConfig::default();
        let store = ItemStatsStore::new();
        let mut learner = Learner::new("alex", &["grammar"]);
        learner.mastery.insert("grammar".to_string(), start);

        for (is_correct, time_spent) in &outcomes {
            let before = learner.mastery_of("grammar").unwrap();
            let outcome = apply_response(
                &config,
                &mut learner,
                &Response {
                    item_id: 1,
                    skill: "grammar".to_string(),
                    is_correct: *is_correct,
                    time_spent: *time_spent,
                    hints_used: 0,
                    lesson: None,
                },
                &store,
                Utc::now(),
            )
            .unwrap();
            prop_assert!((0.0..=1.0).contains(&outcome.new_mastery));
            if *is_correct {
                prop_assert!(outcome.new_mastery >= before);
            } else {
                prop_assert!(outcome.new_mastery <= before);
            }
        }

        let perf = learner.metrics.skill("grammar").unwrap();
        prop_assert_eq!(perf.correct + perf.incorrect, perf.questions_answered);
        prop_assert_eq!(perf.questions_answered, outcomes.len() as u64);
        prop_assert_eq!(store.get(1).unwrap().attempts, outcomes.len() as u64);

        let mean = outcomes.iter().map(|(_, t)| t).sum::<f64>() / outcomes.len() as f64;
        prop_assert!((learner.metrics.average_time_per_question - mean).abs() < 1e-6);
    }

    #[test]
    fn prop_achievements_never_duplicate(
        answered in 0u64..5,
        avg_time in 0.0f64..40.0,
        mastery in prop::collection::vec(prop_oneof![Just(1.0f64), arb_f64_0_1()], 1..5),
    ) {
        let config = EngineConfig::default();
        let skills: Vec<String> = (0..mastery.len()).map(|i| format!("skill_{i}")).collect();
        let mut learner = Learner::new("alex", &skills);
        for (skill, score) in skills.iter().zip(&mastery) {
            learner.mastery.insert(skill.clone(), *score);
        }
        learner.metrics.total_questions_answered = answered;
        learner.metrics.average_time_per_question = avg_time;

        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        evaluate_achievements(&config, &mut learner, today);
        let again = evaluate_achievements(&config, &mut learner, today);
        prop_assert!(again.is_empty());

        let ids: HashSet<&str> = learner.achievements.iter().map(|a| a.id.as_str()).collect();
        prop_assert_eq!(ids.len(), learner.achievements.len());
    }
}

#[test]
fn test_unseen_beginner_item_scores_base() {
    let store = ItemStatsStore::new();
    let item = Item {
        id: 1,
        skill: "grammar".to_string(),
        difficulty: DifficultyLabel::Beginner,
        level: 1,
        lesson: None,
        prompt: None,
        hints: Vec::new(),
        answer: "x".to_string(),
    };
    assert_eq!(calibrate_difficulty(&item, &store), 0.35);
}
