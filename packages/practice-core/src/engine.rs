use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::achievements::{self, AchievementBoard};
use crate::calibration::{calibrate_difficulty_with, predict_success_with};
use crate::catalog::ItemCatalog;
use crate::config::EngineConfig;
use crate::diagnostic::{self, DiagnosticAnswer, DiagnosticItem, DiagnosticReport};
use crate::error::{PracticeError, Result};
use crate::hints::{self, HintReveal};
use crate::progress::{self, Response, ResponseOutcome};
use crate::reports::{self, SessionSummary};
use crate::selection::{self, ScoredItem};
use crate::stats::ItemStatsStore;
use crate::types::{AchievementRecord, Item, ItemId, Learner, ResponseRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeRequest {
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub lesson: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServedItem {
    pub item: Item,
    pub skill: String,
    pub difficulty_score: f64,
    pub predicted_probability: f64,
}

impl ServedItem {
    fn from_scored(scored: ScoredItem<'_>) -> Self {
        Self {
            item: scored.item.clone(),
            skill: scored.item.skill.clone(),
            difficulty_score: scored.difficulty_score,
            predicted_probability: scored.predicted_probability,
        }
    }

    pub fn display_difficulty(&self) -> f64 {
        (self.difficulty_score * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub item_id: ItemId,
    #[serde(default)]
    pub skill: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub lesson: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub skill: String,
    pub new_mastery: f64,
    pub mastery: std::collections::BTreeMap<String, f64>,
    pub new_achievements: Vec<AchievementRecord>,
    pub time_spent: f64,
}

/// Entry point for the adaptive core.
///
/// Holds the tunable config, the item catalog and the population-wide item
/// statistics. Learner records are passed in per call and never retained.
pub struct PracticeEngine<C: ItemCatalog> {
    config: RwLock<EngineConfig>,
    catalog: Arc<C>,
    stats: Arc<ItemStatsStore>,
}

impl<C: ItemCatalog> PracticeEngine<C> {
    pub fn new(
        config: EngineConfig,
        catalog: Arc<C>,
        stats: Arc<ItemStatsStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
            catalog,
            stats,
        })
    }

    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    pub fn reload_config(&self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        *self.config.write() = config;
        tracing::info!("practice engine config reloaded");
        Ok(())
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn stats(&self) -> &ItemStatsStore {
        &self.stats
    }

    pub fn skills(&self) -> Vec<String> {
        self.catalog.skills()
    }

    pub fn new_learner(&self, id: impl Into<String>) -> Learner {
        Learner::new(id, &self.catalog.skills())
    }

    pub fn ensure_skills(&self, learner: &mut Learner) {
        learner.ensure_skills(&self.catalog.skills());
    }

    pub fn calibrate_difficulty(&self, item: &Item) -> f64 {
        calibrate_difficulty_with(&self.config.read(), item, &self.stats)
    }

    pub fn predict_success(&self, mastery: f64, difficulty: f64) -> f64 {
        predict_success_with(self.config.read().logistic_steepness, mastery, difficulty)
    }

    pub fn select_item<'a, R: Rng + ?Sized>(
        &self,
        candidates: &'a [Item],
        mastery: f64,
        target: f64,
        rng: &mut R,
    ) -> Result<ScoredItem<'a>> {
        let config = self.config();
        selection::select_item(&config, candidates, mastery, &self.stats, target, rng)
    }

    pub fn choose_skill<R: Rng + ?Sized>(
        &self,
        learner: &Learner,
        unmastered: &[String],
        rng: &mut R,
    ) -> Option<String> {
        selection::choose_skill(learner, unmastered, rng).map(str::to_string)
    }

    pub fn apply_response(
        &self,
        learner: &mut Learner,
        response: &Response,
        now: DateTime<Utc>,
    ) -> Result<ResponseOutcome> {
        let config = self.config();
        progress::apply_response(&config, learner, response, &self.stats, now)
    }

    pub fn evaluate_achievements(
        &self,
        learner: &mut Learner,
        now: DateTime<Utc>,
    ) -> Vec<AchievementRecord> {
        let config = self.config();
        achievements::evaluate_achievements(&config, learner, now.date_naive())
    }

    /// Serves the next item and opens a practice session on it.
    pub fn next_item<R: Rng + ?Sized>(
        &self,
        learner: &mut Learner,
        request: &PracticeRequest,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<ServedItem> {
        let config = self.config();

        let skill = match request
            .skill
            .as_deref()
            .filter(|skill| learner.mastery.contains_key(*skill))
        {
            Some(skill) => skill.to_string(),
            None => {
                let unmastered = learner.unmastered_skills();
                selection::choose_skill(learner, &unmastered, rng)
                    .map(str::to_string)
                    .ok_or(PracticeError::AllSkillsMastered)?
            }
        };

        let candidates = self
            .catalog
            .items_for(&skill, learner.level, request.lesson.as_deref());
        if candidates.is_empty() {
            tracing::warn!(
                learner_id = %learner.id,
                %skill,
                lesson = ?request.lesson,
                "no candidate items"
            );
            return Err(PracticeError::NoCandidates);
        }

        let mastery = learner.mastery_of(&skill).unwrap_or(0.0);
        let scored = selection::select_item(
            &config,
            &candidates,
            mastery,
            &self.stats,
            config.target_probability,
            rng,
        )?;
        let served = ServedItem::from_scored(scored);

        let session_id = learner.start_session(&served.item, now).session_id;
        tracing::info!(
            learner_id = %learner.id,
            %session_id,
            item_id = served.item.id,
            %skill,
            "practice session started"
        );

        Ok(served)
    }

    /// Scores the answer for the open session, awards achievements and
    /// closes the session. The learner is left untouched on error.
    pub fn submit_answer(
        &self,
        learner: &mut Learner,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let config = self.config();
        let session = learner
            .current_session
            .as_ref()
            .ok_or(PracticeError::NoActiveSession)?;
        if session.item_id != submission.item_id {
            return Err(PracticeError::SessionMismatch {
                expected: session.item_id,
                actual: submission.item_id,
            });
        }

        let elapsed = (now - session.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let hints_used = session.hints_used;
        let catalog_item = self.catalog.item(submission.item_id);

        let skill = match (&submission.skill, &catalog_item) {
            (Some(skill), _) => skill.clone(),
            (None, Some(item)) => item.skill.clone(),
            (None, None) => return Err(PracticeError::ItemNotFound(submission.item_id)),
        };
        let lesson = submission
            .lesson
            .clone()
            .or_else(|| session.lesson.clone())
            .or_else(|| catalog_item.and_then(|item| item.lesson));

        let response = Response {
            item_id: submission.item_id,
            skill: skill.clone(),
            is_correct: submission.is_correct,
            time_spent: elapsed,
            hints_used,
            lesson,
        };
        let outcome = progress::apply_response(&config, learner, &response, &self.stats, now)?;
        let new_achievements =
            achievements::evaluate_achievements(&config, learner, now.date_naive());
        learner.clear_session();

        tracing::info!(
            learner_id = %learner.id,
            item_id = submission.item_id,
            %skill,
            is_correct = submission.is_correct,
            new_mastery = outcome.new_mastery,
            "answer submitted"
        );

        Ok(SubmissionOutcome {
            skill,
            new_mastery: outcome.new_mastery,
            mastery: learner.mastery.clone(),
            new_achievements,
            time_spent: (elapsed * 10.0).round() / 10.0,
        })
    }

    pub fn reveal_hint(&self, learner: &mut Learner, item_id: ItemId) -> Result<HintReveal> {
        let config = self.config();
        hints::reveal_hint(&config, learner, self.catalog.as_ref(), item_id)
    }

    pub fn build_diagnostic(&self) -> Vec<DiagnosticItem> {
        let config = self.config();
        diagnostic::build_diagnostic(
            &config,
            self.catalog.as_ref(),
            &self.catalog.skills(),
            &self.stats,
        )
    }

    pub fn apply_diagnostic(
        &self,
        learner: &mut Learner,
        answers: &[DiagnosticAnswer],
        now: DateTime<Utc>,
    ) -> Result<DiagnosticReport> {
        let config = self.config();
        diagnostic::apply_diagnostic(&config, learner, answers, self.catalog.as_ref(), now)
    }

    pub fn achievement_board(&self, learner: &Learner) -> AchievementBoard {
        let config = self.config();
        let skills: Vec<String> = learner.mastery.keys().cloned().collect();
        achievements::achievement_board(&config, learner, &skills)
    }

    pub fn session_summary(&self, learner: &Learner) -> SessionSummary {
        reports::session_summary(learner, self.config.read().session_window)
    }

    pub fn recent_history<'a>(&self, learner: &'a Learner) -> &'a [ResponseRecord] {
        reports::recent_history(learner, self.config.read().history_limit)
    }

    pub fn recommended_skills(&self, learner: &Learner) -> Vec<String> {
        reports::recommended_skills(learner, self.config.read().weak_accuracy_threshold)
    }
}
