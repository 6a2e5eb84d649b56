//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Turn counter (one resolved round of orders)
pub type Turn = u32;

/// Virtual time inside a single turn's tick scheduler
pub type TickTime = u32;

/// One of the two opposing battle groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Both sides in roster order
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn opponent(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Index into per-side arrays
    pub fn index(&self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Stable identifier of a unit for the lifetime of a match (e.g. `AC1`, `BSQ2`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn carrier(side: Side, n: u32) -> Self {
        Self(format!("{side}C{n}"))
    }

    pub fn squadron(side: Side, n: u32) -> Self {
        Self(format!("{side}SQ{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Winner(Side),
    Draw,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Winner(side) => write!(f, "{side}"),
            MatchResult::Draw => write!(f, "draw"),
        }
    }
}

/// Unique identifier for matches held by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secret handed to a player when they take a seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerToken(pub Uuid);

impl PlayerToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::A.opponent(), Side::B);
        assert_eq!(Side::B.opponent(), Side::A);
    }

    #[test]
    fn test_side_index_matches_both() {
        for (i, side) in Side::BOTH.iter().enumerate() {
            assert_eq!(side.index(), i);
        }
    }

    #[test]
    fn test_unit_id_format() {
        assert_eq!(UnitId::carrier(Side::A, 1).as_str(), "AC1");
        assert_eq!(UnitId::squadron(Side::B, 2).as_str(), "BSQ2");
    }

    #[test]
    fn test_match_result_display() {
        assert_eq!(MatchResult::Winner(Side::B).to_string(), "B");
        assert_eq!(MatchResult::Draw.to_string(), "draw");
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(PlayerToken::new(), PlayerToken::new());
        assert_ne!(MatchId::new(), MatchId::new());
    }
}
