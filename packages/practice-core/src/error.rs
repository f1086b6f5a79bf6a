use thiserror::Error;

use crate::types::ItemId;

#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("no candidate items")]
    NoCandidates,
    #[error("unknown skill: {0}")]
    UnknownSkill(String),
    #[error("all skills mastered")]
    AllSkillsMastered,
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("no active practice session")]
    NoActiveSession,
    #[error("session mismatch: expected item {expected}, got {actual}")]
    SessionMismatch { expected: ItemId, actual: ItemId },
    #[error("no more hints for item {item_id} after {hints_used} used")]
    NoMoreHints { item_id: ItemId, hints_used: u32 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PracticeError>;
