pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{CarrierError, Result};
pub use types::{MatchId, MatchResult, PlayerToken, Side, TickTime, Turn, UnitId};
