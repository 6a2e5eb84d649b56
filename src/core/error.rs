use thiserror::Error;

use crate::core::types::{MatchId, Side};

#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("Orders for side {side} rejected: {}", reasons.join("; "))]
    OrdersRejected { side: Side, reasons: Vec<String> },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Match is already over")]
    MatchOver,

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Player token does not belong to this match")]
    InvalidToken,

    #[error("Match has no open seat")]
    MatchFull,

    #[error("Match is not active")]
    MatchNotActive,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CarrierError>;
