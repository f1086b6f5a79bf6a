use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::types::{skill_title, AchievementRecord, Learner};

pub const FIRST_LESSON: &str = "first_lesson";
pub const SPEED_DEMON: &str = "speed_demon";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "skill", rename_all = "snake_case")]
pub enum AchievementRule {
    FirstLesson,
    SpeedDemon,
    SkillMaster(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub rule: AchievementRule,
}

impl AchievementDefinition {
    pub fn award(&self, earned_date: NaiveDate) -> AchievementRecord {
        AchievementRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            earned_date,
        }
    }

    fn is_met(&self, config: &EngineConfig, learner: &Learner) -> bool {
        match &self.rule {
            AchievementRule::FirstLesson => learner.metrics.total_questions_answered >= 1,
            AchievementRule::SpeedDemon => {
                learner.metrics.average_time_per_question < config.speed_demon_seconds
            }
            AchievementRule::SkillMaster(skill) => learner.mastery_of(skill) == Some(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementBoard {
    pub earned: Vec<AchievementRecord>,
    pub available: Vec<AchievementDefinition>,
}

pub fn master_id(skill: &str) -> String {
    format!("{skill}_master")
}

/// Every achievement a learner can earn, in evaluation order.
pub fn achievement_catalog<S: AsRef<str>>(
    config: &EngineConfig,
    skills: &[S],
) -> Vec<AchievementDefinition> {
    let mut catalog = vec![
        AchievementDefinition {
            id: FIRST_LESSON.to_string(),
            name: "First Steps".to_string(),
            description: "Completed your first lesson!".to_string(),
            icon: "🌟".to_string(),
            rule: AchievementRule::FirstLesson,
        },
        AchievementDefinition {
            id: SPEED_DEMON.to_string(),
            name: "Speed Demon".to_string(),
            description: format!(
                "Average answer time under {} seconds!",
                config.speed_demon_seconds
            ),
            icon: "⚡".to_string(),
            rule: AchievementRule::SpeedDemon,
        },
    ];

    catalog.extend(skills.iter().map(|skill| {
        let skill = skill.as_ref();
        let name = skill_title(skill);
        AchievementDefinition {
            id: master_id(skill),
            name: format!("{name} Master"),
            description: format!("Mastered all {name} skills!"),
            icon: "🏆".to_string(),
            rule: AchievementRule::SkillMaster(skill.to_string()),
        }
    }));

    catalog
}

/// Appends and returns achievements the learner qualifies for but does not
/// hold yet. Calling it again without new progress returns nothing.
pub fn evaluate_achievements(
    config: &EngineConfig,
    learner: &mut Learner,
    today: NaiveDate,
) -> Vec<AchievementRecord> {
    let skills: Vec<String> = learner.mastery.keys().cloned().collect();
    let earned: Vec<AchievementRecord> = achievement_catalog(config, &skills)
        .iter()
        .filter(|def| !learner.has_achievement(&def.id) && def.is_met(config, learner))
        .map(|def| def.award(today))
        .collect();

    for record in &earned {
        tracing::info!(learner_id = %learner.id, achievement = %record.id, "achievement earned");
    }
    learner.achievements.extend(earned.iter().cloned());

    earned
}

pub fn achievement_board<S: AsRef<str>>(
    config: &EngineConfig,
    learner: &Learner,
    skills: &[S],
) -> AchievementBoard {
    AchievementBoard {
        earned: learner.achievements.clone(),
        available: achievement_catalog(config, skills)
            .into_iter()
            .filter(|def| !learner.has_achievement(&def.id))
            .collect(),
    }
}
