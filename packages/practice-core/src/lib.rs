//! Adaptive practice core.
//!
//! Tracks per-skill mastery for a learner and serves the practice item whose
//! predicted success probability sits closest to a target, then folds the
//! learner's answer back into mastery, metrics, achievements and the
//! population-wide item statistics that recalibrate difficulty.
//!
//! Everything here is synchronous and in-memory. Loading and saving learner
//! records and item statistics is left to the caller.

pub mod achievements;
pub mod calibration;
pub mod catalog;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod hints;
pub mod logging;
pub mod progress;
pub mod reports;
pub mod selection;
pub mod stats;
pub mod types;

pub use calibration::{calibrate_difficulty, predict_success};
pub use catalog::{InMemoryCatalog, ItemCatalog};
pub use config::{EngineConfig, LogConfig};
pub use engine::{PracticeEngine, PracticeRequest, ServedItem, Submission, SubmissionOutcome};
pub use error::{PracticeError, Result};
pub use progress::{Response, ResponseOutcome};
pub use stats::ItemStatsStore;
pub use types::*;
