use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum DifficultyLabel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    #[serde(other)]
    Unknown,
}

impl DifficultyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Unknown => "unknown",
        }
    }

    pub fn base_score(&self) -> f64 {
        match self {
            Self::Beginner => 0.35,
            Self::Intermediate => 0.60,
            Self::Advanced => 0.85,
            Self::Unknown => 0.50,
        }
    }

    /// Ordering used when picking gentle onboarding items; unknown labels sit
    /// with intermediate.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate | Self::Unknown => 1,
            Self::Advanced => 2,
        }
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// `reading_comprehension` -> `Reading Comprehension`
pub(crate) fn skill_title(skill: &str) -> String {
    skill
        .split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn default_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub skill: String,
    #[serde(default)]
    pub difficulty: DifficultyLabel,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub attempts: u64,
    pub correct: u64,
    pub incorrect: u64,
}

impl ItemStats {
    pub fn accuracy(&self) -> Option<f64> {
        (self.attempts > 0).then(|| self.correct as f64 / self.attempts as f64)
    }

    pub(crate) fn record(&mut self, is_correct: bool) {
        self.attempts += 1;
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillPerformance {
    pub questions_answered: u64,
    pub correct: u64,
    pub incorrect: u64,
    pub average_time: f64,
    #[serde(default)]
    pub struggling_areas: Vec<String>,
}

impl SkillPerformance {
    /// Unseen skills count as accuracy 0 so they are practised first.
    pub fn accuracy(&self) -> f64 {
        if self.questions_answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.questions_answered as f64
        }
    }

    pub fn is_struggling(&self) -> bool {
        !self.struggling_areas.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_questions_answered: u64,
    pub correct_answers: u64,
    pub incorrect_answers: u64,
    pub average_time_per_question: f64,
    #[serde(default)]
    pub skill_performance: BTreeMap<String, SkillPerformance>,
}

impl Metrics {
    pub fn skill(&self, skill: &str) -> Option<&SkillPerformance> {
        self.skill_performance.get(skill)
    }

    /// Replaces the struggling sub-areas recorded for `skill`.
    pub fn set_struggling_areas(&mut self, skill: &str, areas: Vec<String>) {
        self.skill_performance
            .entry(skill.to_string())
            .or_default()
            .struggling_areas = areas;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: ItemId,
    pub skill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
    pub is_correct: bool,
    pub time_spent: f64,
    pub hints_used: u32,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub earned_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub session_id: Uuid,
    pub item_id: ItemId,
    pub hints_used: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learner {
    pub id: String,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub mastery: BTreeMap<String, f64>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub achievements: Vec<AchievementRecord>,
    #[serde(default)]
    pub history: Vec<ResponseRecord>,
    #[serde(default)]
    pub current_session: Option<CurrentSession>,
    #[serde(default)]
    pub diagnostic_complete: bool,
}

impl Learner {
    pub fn new<S: AsRef<str>>(id: impl Into<String>, skills: &[S]) -> Self {
        let id = id.into();

        Self {
            name: capitalize(&id),
            id,
            level: 1,
            mastery: skills
                .iter()
                .map(|skill| (skill.as_ref().to_string(), 0.0))
                .collect(),
            metrics: Metrics::default(),
            achievements: Vec::new(),
            history: Vec::new(),
            current_session: None,
            diagnostic_complete: false,
        }
    }

    /// Adds a zero mastery entry for every skill the learner has not seen.
    pub fn ensure_skills<S: AsRef<str>>(&mut self, skills: &[S]) {
        for skill in skills {
            self.mastery.entry(skill.as_ref().to_string()).or_insert(0.0);
        }
    }

    /// Wipes progress while keeping identity and level.
    pub fn reset_progress<S: AsRef<str>>(&mut self, skills: &[S]) {
        let name = std::mem::take(&mut self.name);
        let level = self.level;
        *self = Self {
            name,
            level,
            ..Self::new(std::mem::take(&mut self.id), skills)
        };
    }

    pub fn mastery_of(&self, skill: &str) -> Option<f64> {
        self.mastery.get(skill).copied()
    }

    pub fn unmastered_skills(&self) -> Vec<String> {
        self.mastery
            .iter()
            .filter(|(_, score)| **score < 1.0)
            .map(|(skill, _)| skill.clone())
            .collect()
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    pub fn start_session(&mut self, item: &Item, now: DateTime<Utc>) -> &CurrentSession {
        self.current_session.insert(CurrentSession {
            session_id: Uuid::new_v4(),
            item_id: item.id,
            hints_used: 0,
            started_at: now,
            lesson: item.lesson.clone(),
        })
    }

    pub fn clear_session(&mut self) -> Option<CurrentSession> {
        self.current_session.take()
    }
}
