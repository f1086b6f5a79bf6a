//! Applying a learner's response: history, metrics, mastery and the shared
//! item statistics that feed difficulty calibration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{PracticeError, Result};
use crate::stats::ItemStatsStore;
use crate::types::{ItemId, ItemStats, Learner, ResponseRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub item_id: ItemId,
    pub skill: String,
    pub is_correct: bool,
    pub time_spent: f64,
    pub hints_used: u32,
    #[serde(default)]
    pub lesson: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub previous_mastery: f64,
    pub new_mastery: f64,
    pub sequence: u64,
    pub item_stats: ItemStats,
}

fn running_mean(old_avg: f64, count: u64, sample: f64) -> f64 {
    (old_avg * (count - 1) as f64 + sample) / count as f64
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Appends the history record and folds the response into the learner's
/// aggregate and per-skill metrics. Mastery is left untouched.
pub(crate) fn record_metrics(
    learner: &mut Learner,
    response: &Response,
    now: DateTime<Utc>,
) -> u64 {
    let time_spent = if response.time_spent.is_finite() && response.time_spent >= 0.0 {
        response.time_spent
    } else {
        tracing::warn!(
            learner_id = %learner.id,
            item_id = response.item_id,
            time_spent = response.time_spent,
            "invalid time spent, counting as zero"
        );
        0.0
    };

    let sequence = learner.history.len() as u64 + 1;
    learner.history.push(ResponseRecord {
        item_id: response.item_id,
        skill: response.skill.clone(),
        lesson: response.lesson.clone(),
        is_correct: response.is_correct,
        time_spent: round_tenths(time_spent),
        hints_used: response.hints_used,
        timestamp: now,
        sequence,
    });

    let metrics = &mut learner.metrics;
    metrics.total_questions_answered += 1;
    if response.is_correct {
        metrics.correct_answers += 1;
    } else {
        metrics.incorrect_answers += 1;
    }
    metrics.average_time_per_question = running_mean(
        metrics.average_time_per_question,
        metrics.total_questions_answered,
        time_spent,
    );

    let skill = metrics
        .skill_performance
        .entry(response.skill.clone())
        .or_default();
    skill.questions_answered += 1;
    if response.is_correct {
        skill.correct += 1;
    } else {
        skill.incorrect += 1;
    }
    skill.average_time = running_mean(skill.average_time, skill.questions_answered, time_spent);

    sequence
}

/// Asymmetric reinforcement step, clamped to `[0, 1]`.
pub fn next_mastery(config: &EngineConfig, mastery: f64, is_correct: bool) -> f64 {
    let stepped = if is_correct {
        mastery + config.correct_step
    } else {
        mastery - config.incorrect_step
    };
    stepped.clamp(0.0, 1.0)
}

/// Applies one response to `learner` and to the shared item statistics.
///
/// Fails with [`PracticeError::UnknownSkill`] before touching anything when
/// the skill has no mastery entry.
pub fn apply_response(
    config: &EngineConfig,
    learner: &mut Learner,
    response: &Response,
    stats: &ItemStatsStore,
    now: DateTime<Utc>,
) -> Result<ResponseOutcome> {
    let previous_mastery = learner
        .mastery_of(&response.skill)
        .ok_or_else(|| PracticeError::UnknownSkill(response.skill.clone()))?;

    let sequence = record_metrics(learner, response, now);

    let new_mastery = next_mastery(config, previous_mastery, response.is_correct);
    learner.mastery.insert(response.skill.clone(), new_mastery);

    let item_stats = stats.record(response.item_id, response.is_correct);

    tracing::debug!(
        learner_id = %learner.id,
        skill = %response.skill,
        item_id = response.item_id,
        is_correct = response.is_correct,
        previous_mastery,
        new_mastery,
        "response applied"
    );

    Ok(ResponseOutcome {
        previous_mastery,
        new_mastery,
        sequence,
        item_stats,
    })
}
