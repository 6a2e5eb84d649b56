//! Hex coordinate system for the sea map (odd-r offset coordinates)
//!
//! Positions are stored as offset `(x, y)` columns and rows of a pointy-top
//! grid where odd rows are shoved half a hex to the right. Distances and
//! lines are computed by converting to axial/cube coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Neighbor deltas for even rows
const EVEN_ROW_DELTAS: [(i32, i32); 6] = [(1, 0), (0, -1), (-1, -1), (-1, 0), (-1, 1), (0, 1)];

/// Neighbor deltas for odd rows
const ODD_ROW_DELTAS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (0, 1), (1, 1)];

/// Offset hex coordinate on the sea map
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    pub x: i32,
    pub y: i32,
}

impl HexCoord {
    /// "Not on the map" - squadrons at base or lost, sunk carriers
    pub const INVALID: HexCoord = HexCoord { x: -1, y: -1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    fn is_odd_row(&self) -> bool {
        self.y & 1 == 1
    }

    /// Axial (q, r) for this offset position
    pub fn to_axial(&self) -> (i32, i32) {
        let q = self.x - (self.y - (self.y & 1)) / 2;
        (q, self.y)
    }

    /// Cube (x, y, z) with x + y + z == 0
    pub fn to_cube(&self) -> (i32, i32, i32) {
        let (q, r) = self.to_axial();
        (q, -q - r, r)
    }

    /// Offset position for an axial (q, r)
    pub fn from_axial(q: i32, r: i32) -> Self {
        Self::new(q + (r - (r & 1)) / 2, r)
    }

    /// Hex steps between two cells (Chebyshev distance in cube space)
    pub fn distance(&self, other: &Self) -> u32 {
        let (ax, ay, az) = self.to_cube();
        let (bx, by, bz) = other.to_cube();
        let dx = (ax - bx).abs();
        let dy = (ay - by).abs();
        let dz = (az - bz).abs();
        dx.max(dy).max(dz) as u32
    }

    /// All 6 neighboring coordinates (may lie off the map)
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let deltas = if self.is_odd_row() {
            &ODD_ROW_DELTAS
        } else {
            &EVEN_ROW_DELTAS
        };
        deltas.map(|(dx, dy)| HexCoord::new(self.x + dx, self.y + dy))
    }

    /// Centre of the hex in unit-size pixel space
    pub fn pixel_center(&self) -> (f32, f32) {
        let shove = if self.is_odd_row() { 0.5 } else { 0.0 };
        (3f32.sqrt() * (self.x as f32 + shove), 1.5 * self.y as f32)
    }

    /// Bearing from this hex to another, in radians
    pub fn angle_to(&self, other: &Self) -> f32 {
        let (x0, y0) = self.pixel_center();
        let (x1, y1) = other.pixel_center();
        (y1 - y0).atan2(x1 - x0)
    }

    /// Get hex coordinates in a line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        let (q0, r0) = self.to_axial();
        let (q1, r1) = other.to_axial();
        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = f64::from(i) / f64::from(n);
            // Nudge off exact edges so ties round consistently
            let q = f64::from(q0) + f64::from(q1 - q0) * t + 1e-6;
            let r = f64::from(r0) + f64::from(r1 - r0) * t + 1e-6;
            results.push(Self::round_axial(q, r));
        }
        results
    }

    /// Round floating point axial hex to nearest integer hex
    fn round_axial(q: f64, r: f64) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::from_axial(rq as i32, rr as i32)
    }

    /// Get all hexes within range (inclusive), unclipped
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoord> {
        let range = range as i32;
        let (q0, r0) = self.to_axial();
        let mut results = Vec::new();
        for dq in -range..=range {
            for dr in (-range).max(-dq - range)..=range.min(-dq + range) {
                results.push(Self::from_axial(q0 + dq, r0 + dr));
            }
        }
        results
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}
