use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Learner, ResponseRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub accuracy: f64,
    pub average_time: f64,
    pub total_hints_used: u32,
    pub skills_practiced: Vec<String>,
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The last `limit` responses, oldest first.
pub fn recent_history(learner: &Learner, limit: usize) -> &[ResponseRecord] {
    let start = learner.history.len().saturating_sub(limit);
    &learner.history[start..]
}

/// Accuracy (percent) and timing over the last `window` responses.
pub fn session_summary(learner: &Learner, window: usize) -> SessionSummary {
    let recent = recent_history(learner, window);
    if recent.is_empty() {
        return SessionSummary::default();
    }

    let total = recent.len();
    let correct = recent.iter().filter(|r| r.is_correct).count();
    let total_time: f64 = recent.iter().map(|r| r.time_spent).sum();
    let skills: BTreeSet<&str> = recent.iter().map(|r| r.skill.as_str()).collect();

    SessionSummary {
        total_questions: total,
        correct_answers: correct,
        accuracy: round_tenths(correct as f64 / total as f64 * 100.0),
        average_time: round_tenths(total_time / total as f64),
        total_hints_used: recent.iter().map(|r| r.hints_used).sum(),
        skills_practiced: skills.into_iter().map(str::to_string).collect(),
    }
}

/// Skills flagged as struggling or answered below `weak_accuracy`.
pub fn recommended_skills(learner: &Learner, weak_accuracy: f64) -> Vec<String> {
    learner
        .metrics
        .skill_performance
        .iter()
        .filter(|(_, perf)| perf.is_struggling() || perf.accuracy() < weak_accuracy)
        .map(|(skill, _)| skill.clone())
        .collect()
}
