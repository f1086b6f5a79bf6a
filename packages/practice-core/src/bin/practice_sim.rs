//! Drives a simulated learner through the adaptive loop.
//!
//! Usage: `practice-sim <catalog.json> [answers] [seed]`

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use practice_core::logging::init_tracing;
use practice_core::{
    EngineConfig, InMemoryCatalog, ItemStatsStore, LogConfig, PracticeEngine, PracticeError,
    PracticeRequest, Submission,
};

const DEFAULT_ANSWERS: usize = 20;
const DEFAULT_SEED: u64 = 42;

fn run(args: &[String]) -> Result<(), PracticeError> {
    let Some(path) = args.get(1) else {
        eprintln!("usage: practice-sim <catalog.json> [answers] [seed]");
        std::process::exit(2);
    };
    let answers = args
        .get(2)
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_ANSWERS);
    let seed = args
        .get(3)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEED);

    let catalog = InMemoryCatalog::load(path)?;
    let engine = PracticeEngine::new(
        EngineConfig::from_env(),
        Arc::new(catalog),
        Arc::new(ItemStatsStore::new()),
    )?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut learner = engine.new_learner("simulated");
    let mut now = Utc::now();

    for _ in 0..answers {
        let request = PracticeRequest::default();
        let served = match engine.next_item(&mut learner, &request, &mut rng, now) {
            Ok(served) => served,
            Err(PracticeError::AllSkillsMastered) => {
                tracing::info!("all skills mastered, stopping early");
                break;
            }
            Err(err) => return Err(err),
        };

        now += Duration::milliseconds(rng.random_range(3_000..30_000));
        let is_correct = rng.random::<f64>() < served.predicted_probability;
        engine.submit_answer(
            &mut learner,
            &Submission {
                item_id: served.item.id,
                skill: Some(served.skill.clone()),
                is_correct,
                lesson: None,
            },
            now,
        )?;
    }

    let report = json!({
        "learner": learner,
        "summary": engine.session_summary(&learner),
        "recommended_skills": engine.recommended_skills(&learner),
        "item_stats": engine.stats().snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() {
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing(&LogConfig::from_env());

    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = run(&args) {
        tracing::error!(error = %err, "simulation failed");
        std::process::exit(1);
    }
}
