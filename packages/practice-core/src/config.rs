use serde::{Deserialize, Serialize};

use crate::error::{PracticeError, Result};

/// Tunable heuristics of the adaptive core.
///
/// Defaults reproduce the production behaviour; every field can be
/// overridden through `PRACTICE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub target_probability: f64,
    pub logistic_steepness: f64,
    pub accuracy_prior: f64,
    pub difficulty_shift_weight: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub tie_epsilon: f64,
    pub correct_step: f64,
    pub incorrect_step: f64,
    pub speed_demon_seconds: f64,
    pub reveal_answer_after_hints: u32,
    pub diagnostic_floor: f64,
    pub diagnostic_range: f64,
    pub diagnostic_time_seconds: f64,
    pub recommendation_ceiling: f64,
    pub weak_accuracy_threshold: f64,
    pub history_limit: usize,
    pub session_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_probability: 0.7,
            logistic_steepness: 5.0,
            accuracy_prior: 0.7,
            difficulty_shift_weight: 0.4,
            min_difficulty: 0.05,
            max_difficulty: 0.95,
            tie_epsilon: 1e-6,
            correct_step: 0.25,
            incorrect_step: 0.1,
            speed_demon_seconds: 15.0,
            reveal_answer_after_hints: 3,
            diagnostic_floor: 0.3,
            diagnostic_range: 0.7,
            diagnostic_time_seconds: 5.0,
            recommendation_ceiling: 0.75,
            weak_accuracy_threshold: 0.7,
            history_limit: 50,
            session_window: 10,
        }
    }
}

fn env_override<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(parsed) => *slot = parsed,
            Err(_) => tracing::warn!(key, value = %val, "ignoring unparsable config override"),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_override("PRACTICE_TARGET_PROBABILITY", &mut config.target_probability);
        env_override("PRACTICE_LOGISTIC_STEEPNESS", &mut config.logistic_steepness);
        env_override("PRACTICE_ACCURACY_PRIOR", &mut config.accuracy_prior);
        env_override(
            "PRACTICE_DIFFICULTY_SHIFT_WEIGHT",
            &mut config.difficulty_shift_weight,
        );
        env_override("PRACTICE_MIN_DIFFICULTY", &mut config.min_difficulty);
        env_override("PRACTICE_MAX_DIFFICULTY", &mut config.max_difficulty);
        env_override("PRACTICE_TIE_EPSILON", &mut config.tie_epsilon);
        env_override("PRACTICE_CORRECT_STEP", &mut config.correct_step);
        env_override("PRACTICE_INCORRECT_STEP", &mut config.incorrect_step);
        env_override("PRACTICE_SPEED_DEMON_SECONDS", &mut config.speed_demon_seconds);
        env_override(
            "PRACTICE_REVEAL_ANSWER_AFTER_HINTS",
            &mut config.reveal_answer_after_hints,
        );
        env_override("PRACTICE_DIAGNOSTIC_FLOOR", &mut config.diagnostic_floor);
        env_override("PRACTICE_DIAGNOSTIC_RANGE", &mut config.diagnostic_range);
        env_override(
            "PRACTICE_DIAGNOSTIC_TIME_SECONDS",
            &mut config.diagnostic_time_seconds,
        );
        env_override(
            "PRACTICE_RECOMMENDATION_CEILING",
            &mut config.recommendation_ceiling,
        );
        env_override(
            "PRACTICE_WEAK_ACCURACY_THRESHOLD",
            &mut config.weak_accuracy_threshold,
        );
        env_override("PRACTICE_HISTORY_LIMIT", &mut config.history_limit);
        env_override("PRACTICE_SESSION_WINDOW", &mut config.session_window);

        config
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(PracticeError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )))
            }
        };

        unit("target_probability", self.target_probability)?;
        unit("accuracy_prior", self.accuracy_prior)?;
        unit("correct_step", self.correct_step)?;
        unit("incorrect_step", self.incorrect_step)?;
        unit("recommendation_ceiling", self.recommendation_ceiling)?;
        unit("weak_accuracy_threshold", self.weak_accuracy_threshold)?;

        if self.logistic_steepness <= 0.0 {
            return Err(PracticeError::InvalidConfig(
                "logistic_steepness must be positive".to_string(),
            ));
        }
        if !(0.0 <= self.min_difficulty && self.min_difficulty < self.max_difficulty)
            || self.max_difficulty > 1.0
        {
            return Err(PracticeError::InvalidConfig(format!(
                "difficulty bounds must satisfy 0 <= min < max <= 1, got [{}, {}]",
                self.min_difficulty, self.max_difficulty
            )));
        }
        if self.tie_epsilon < 0.0 {
            return Err(PracticeError::InvalidConfig(
                "tie_epsilon must not be negative".to_string(),
            ));
        }
        if self.diagnostic_floor + self.diagnostic_range > 1.0 + f64::EPSILON {
            return Err(PracticeError::InvalidConfig(
                "diagnostic_floor + diagnostic_range must not exceed 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub file_logs: bool,
    pub log_dir: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());

        Self {
            log_level,
            file_logs,
            log_dir,
        }
    }
}
