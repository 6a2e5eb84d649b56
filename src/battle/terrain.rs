//! Sea map terrain
//!
//! Ships stay on open water; aircraft fly over islands.

use serde::{Deserialize, Serialize};

/// Terrain of a single hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    #[default]
    Sea,
    Land,
}

impl Terrain {
    /// Can a ship enter this hex?
    pub fn navigable(&self) -> bool {
        matches!(self, Terrain::Sea)
    }

    /// Can this hex be entered at all, given whether islands are passable?
    pub fn passable(&self, pass_islands: bool) -> bool {
        pass_islands || self.navigable()
    }

    /// Single-character glyph for text dumps
    pub fn glyph(&self) -> char {
        match self {
            Terrain::Sea => '.',
            Terrain::Land => '#',
        }
    }
}
