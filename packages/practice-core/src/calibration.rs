//! Difficulty calibration and success prediction.
//!
//! An item's difficulty blends its static label with how the whole
//! population performs on it; a learner's chance of answering it follows a
//! logistic curve over the gap between mastery and difficulty.

use crate::config::EngineConfig;
use crate::stats::ItemStatsStore;
use crate::types::{DifficultyLabel, Item, ItemStats};

pub fn difficulty_score(
    config: &EngineConfig,
    label: DifficultyLabel,
    stats: Option<ItemStats>,
) -> f64 {
    let global_accuracy = stats
        .and_then(|s| s.accuracy())
        .unwrap_or(config.accuracy_prior);

    // Items the population misses more than the prior get harder, and vice versa.
    let shift = (config.accuracy_prior - global_accuracy) * config.difficulty_shift_weight;
    (label.base_score() + shift).clamp(config.min_difficulty, config.max_difficulty)
}

pub fn calibrate_difficulty_with(
    config: &EngineConfig,
    item: &Item,
    stats: &ItemStatsStore,
) -> f64 {
    difficulty_score(config, item.difficulty, stats.get(item.id))
}

/// Calibrated difficulty in `[0.05, 0.95]` using the default heuristics.
pub fn calibrate_difficulty(item: &Item, stats: &ItemStatsStore) -> f64 {
    calibrate_difficulty_with(&EngineConfig::default(), item, stats)
}

pub fn predict_success_with(steepness: f64, mastery: f64, difficulty: f64) -> f64 {
    sigmoid(steepness * (mastery - difficulty)).clamp(0.0, 1.0)
}

/// Probability of a correct answer; exactly 0.5 when mastery equals difficulty.
pub fn predict_success(mastery: f64, difficulty: f64) -> f64 {
    predict_success_with(EngineConfig::default().logistic_steepness, mastery, difficulty)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
