use serde::{Deserialize, Serialize};

use crate::catalog::ItemCatalog;
use crate::config::EngineConfig;
use crate::error::{PracticeError, Result};
use crate::types::{ItemId, Learner};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintReveal {
    pub hint: String,
    pub is_answer: bool,
    pub hints_used: u32,
}

/// Reveals the next progressive hint for the item in the learner's session.
///
/// Once the item's hints run out and enough have been consumed, the answer
/// itself is returned instead; the session counter stops advancing there.
pub fn reveal_hint<C: ItemCatalog + ?Sized>(
    config: &EngineConfig,
    learner: &mut Learner,
    catalog: &C,
    item_id: ItemId,
) -> Result<HintReveal> {
    let session = learner
        .current_session
        .as_mut()
        .ok_or(PracticeError::NoActiveSession)?;
    if session.item_id != item_id {
        return Err(PracticeError::SessionMismatch {
            expected: session.item_id,
            actual: item_id,
        });
    }

    let item = catalog
        .item(item_id)
        .ok_or(PracticeError::ItemNotFound(item_id))?;
    let used = session.hints_used;

    if let Some(hint) = item.hints.get(used as usize) {
        session.hints_used = used + 1;
        return Ok(HintReveal {
            hint: hint.clone(),
            is_answer: false,
            hints_used: session.hints_used,
        });
    }

    if used >= config.reveal_answer_after_hints {
        tracing::info!(learner_id = %learner.id, item_id, "hints exhausted, revealing answer");
        return Ok(HintReveal {
            hint: format!("The answer is: {}", item.answer),
            is_answer: true,
            hints_used: used + 1,
        });
    }

    tracing::warn!(learner_id = %learner.id, item_id, hints_used = used, "no more hints");
    Err(PracticeError::NoMoreHints {
        item_id,
        hints_used: used,
    })
}
