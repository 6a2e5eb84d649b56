//! Sea map: a dense rectangular grid of sea and land hexes
//!
//! Lookups are O(1) through a row-major `Vec<Terrain>`.

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::battle::terrain::Terrain;

/// The full sea map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexGrid {
    pub width: u32,
    pub height: u32,
    cells: Vec<Terrain>,
}

impl HexGrid {
    /// Create a new all-sea map
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Terrain::Sea; width as usize * height as usize],
        }
    }

    /// Build a map from rows of terrain codes (0 = sea, anything else = land)
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, &code) in row.iter().enumerate() {
                if code != 0 {
                    grid.set_terrain(HexCoord::new(x as i32, y as i32), Terrain::Land);
                }
            }
        }
        grid
    }

    /// Rows of terrain codes (0 = sea, 1 = land) for client payloads
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| match self.terrain(HexCoord::new(x, y)) {
                        Some(Terrain::Sea) => 0,
                        _ => 1,
                    })
                    .collect()
            })
            .collect()
    }

    fn index(&self, coord: HexCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Check if coordinate is within map bounds
    pub fn in_bounds(&self, coord: HexCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.x < self.width as i32
            && coord.y < self.height as i32
    }

    pub fn terrain(&self, coord: HexCoord) -> Option<Terrain> {
        self.index(coord).map(|i| self.cells[i])
    }

    /// Set terrain; out-of-bounds writes are ignored
    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = terrain;
        }
    }

    /// In bounds and open water
    pub fn is_sea(&self, coord: HexCoord) -> bool {
        self.terrain(coord) == Some(Terrain::Sea)
    }

    /// In bounds and enterable under the given island rule
    pub fn is_passable(&self, coord: HexCoord, pass_islands: bool) -> bool {
        self.terrain(coord)
            .is_some_and(|t| t.passable(pass_islands))
    }

    /// Neighbors that lie on the map
    pub fn neighbors(&self, coord: HexCoord) -> impl Iterator<Item = HexCoord> + '_ {
        coord
            .neighbors()
            .into_iter()
            .filter(move |n| self.in_bounds(*n))
    }

    /// All coordinates, row-major
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| HexCoord::new(x, y)))
    }

    pub fn sea_cells(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.coords().filter(|c| self.is_sea(*c))
    }

    /// Get all in-bounds hexes within range
    pub fn hexes_in_range(&self, center: HexCoord, range: u32) -> Vec<HexCoord> {
        center
            .hexes_in_range(range)
            .into_iter()
            .filter(|c| self.in_bounds(*c))
            .collect()
    }

    /// True when every sea cell can reach every other sea cell
    ///
    /// A map with no sea at all is not connected.
    pub fn validate_sea_connectivity(&self) -> bool {
        let Some(start) = self.sea_cells().next() else {
            return false;
        };

        let mut seen: AHashSet<HexCoord> = AHashSet::new();
        let mut frontier = VecDeque::new();
        seen.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            for n in self.neighbors(current) {
                if self.is_sea(n) && seen.insert(n) {
                    frontier.push_back(n);
                }
            }
        }

        seen.len() == self.sea_cells().count()
    }

    /// Text dump with odd rows indented half a cell
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height as i32 {
            if y & 1 == 1 {
                out.push(' ');
            }
            for x in 0..self.width as i32 {
                let glyph = self
                    .terrain(HexCoord::new(x, y))
                    .map(|t| t.glyph())
                    .unwrap_or(' ');
                out.push(glyph);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}
