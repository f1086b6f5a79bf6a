//! Onboarding assessment: one gentle item per skill, then a baseline
//! mastery estimate and lesson recommendations from the answers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::calibrate_difficulty_with;
use crate::catalog::ItemCatalog;
use crate::config::EngineConfig;
use crate::error::{PracticeError, Result};
use crate::progress::{record_metrics, Response};
use crate::stats::ItemStatsStore;
use crate::types::{skill_title, Item, ItemId, Learner, Lesson};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    pub item: Item,
    pub difficulty_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticAnswer {
    pub item_id: ItemId,
    pub skill: String,
    pub is_correct: bool,
    #[serde(default)]
    pub lesson: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRecommendation {
    pub skill: String,
    pub lesson: Lesson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub mastery_updates: BTreeMap<String, f64>,
    pub recommended_lessons: Vec<LessonRecommendation>,
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Picks the easiest item of each skill: lowest label rank, then lowest
/// calibrated difficulty. Skills without items are skipped.
pub fn build_diagnostic<C: ItemCatalog + ?Sized, S: AsRef<str>>(
    config: &EngineConfig,
    catalog: &C,
    skills: &[S],
    stats: &ItemStatsStore,
) -> Vec<DiagnosticItem> {
    skills
        .iter()
        .filter_map(|skill| {
            catalog
                .items_for(skill.as_ref(), u32::MAX, None)
                .into_iter()
                .map(|item| {
                    let score = calibrate_difficulty_with(config, &item, stats);
                    (item, score)
                })
                .min_by(|(a, a_score), (b, b_score)| {
                    a.difficulty
                        .rank()
                        .cmp(&b.difficulty.rank())
                        .then(a_score.total_cmp(b_score))
                })
                .map(|(item, score)| DiagnosticItem {
                    item,
                    difficulty_score: round_hundredths(score),
                })
        })
        .collect()
}

fn placeholder_lesson(skill: &str) -> Lesson {
    Lesson {
        id: format!("{skill}_lesson_1"),
        title: skill_title(skill),
        description: "Core practice for this skill.".to_string(),
    }
}

/// Scores a completed diagnostic and rewrites baseline mastery.
///
/// Every answer lands in history and metrics at a fixed nominal duration.
/// Per skill, mastery becomes `floor + range * accuracy`; skills still below
/// the recommendation ceiling get their first lesson suggested, weakest first.
pub fn apply_diagnostic<C: ItemCatalog + ?Sized>(
    config: &EngineConfig,
    learner: &mut Learner,
    answers: &[DiagnosticAnswer],
    catalog: &C,
    now: DateTime<Utc>,
) -> Result<DiagnosticReport> {
    if let Some(unknown) = answers
        .iter()
        .find(|a| !learner.mastery.contains_key(&a.skill))
    {
        return Err(PracticeError::UnknownSkill(unknown.skill.clone()));
    }

    let mut tally: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for answer in answers {
        let entry = tally.entry(answer.skill.clone()).or_default();
        entry.0 += 1;
        if answer.is_correct {
            entry.1 += 1;
        }

        record_metrics(
            learner,
            &Response {
                item_id: answer.item_id,
                skill: answer.skill.clone(),
                is_correct: answer.is_correct,
                time_spent: config.diagnostic_time_seconds,
                hints_used: 0,
                lesson: answer.lesson.clone(),
            },
            now,
        );
    }

    let mut mastery_updates = BTreeMap::new();
    for (skill, (attempts, correct)) in tally {
        let accuracy = correct as f64 / attempts as f64;
        let score = (config.diagnostic_floor + config.diagnostic_range * accuracy).clamp(0.0, 1.0);
        learner.mastery.insert(skill.clone(), score);
        mastery_updates.insert(skill, score);
    }

    let mut ranked: Vec<(&String, f64)> = mastery_updates.iter().map(|(s, v)| (s, *v)).collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let recommended_lessons = ranked
        .into_iter()
        .filter(|(_, score)| *score < config.recommendation_ceiling)
        .map(|(skill, _)| {
            let lesson = catalog
                .lessons_for(skill)
                .into_iter()
                .next()
                .unwrap_or_else(|| placeholder_lesson(skill));
            LessonRecommendation {
                skill: skill.clone(),
                lesson,
            }
        })
        .collect();

    learner.diagnostic_complete = true;
    tracing::info!(
        learner_id = %learner.id,
        skills = mastery_updates.len(),
        "diagnostic applied"
    );

    Ok(DiagnosticReport {
        mastery_updates,
        recommended_lessons,
    })
}
