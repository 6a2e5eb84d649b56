//! Per-side visibility (fog of war) and intel memory
//!
//! Each side sees the union of its units' vision disks. Sightings of enemy
//! units become TTL markers that fade over turns without contact, and the
//! tick-level detection ledger is condensed into first/last seen paths.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::battle_map::HexGrid;
use crate::battle::hex::HexCoord;
use crate::battle::units::Unit;
use crate::core::types::{Side, TickTime, Turn, UnitId};

/// Cells one unit saw this turn: its end position plus, for squadrons,
/// every waypoint it flew through
pub fn unit_visible_cells(grid: &HexGrid, unit: &Unit, path: &[HexCoord]) -> AHashSet<HexCoord> {
    let mut visible = AHashSet::new();
    if !unit.is_active() {
        return visible;
    }

    visible.extend(grid.hexes_in_range(unit.pos, unit.vision));
    if unit.is_squadron() {
        for waypoint in path.iter().filter(|p| p.is_valid()) {
            visible.extend(grid.hexes_in_range(*waypoint, unit.vision));
        }
    }
    visible
}

/// Calculate visibility for an entire side
pub fn side_visible_cells<'a>(
    grid: &HexGrid,
    side: Side,
    units: impl IntoIterator<Item = (&'a Unit, &'a [HexCoord])>,
) -> AHashSet<HexCoord> {
    let mut visible = AHashSet::new();
    for (unit, path) in units {
        if unit.side == side {
            visible.extend(unit_visible_cells(grid, unit, path));
        }
    }
    visible
}

/// Last known whereabouts of one enemy unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelMarker {
    pub seen: bool,
    pub pos: HexCoord,
    /// Turns left before the sighting is forgotten
    pub ttl: u32,
}

impl IntelMarker {
    pub fn sighted(pos: HexCoord, ttl: u32) -> Self {
        Self { seen: true, pos, ttl }
    }

    /// One turn without contact
    pub fn decay(&mut self) {
        self.ttl = self.ttl.saturating_sub(1);
        if self.ttl == 0 {
            self.seen = false;
        }
    }

    pub fn is_live(&self) -> bool {
        self.ttl > 0
    }
}

/// Where an enemy unit was first and last spotted during one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelPath {
    /// Side of the spotted unit
    pub side: Side,
    pub unit_id: UnitId,
    pub turn: Turn,
    pub first_seen: HexCoord,
    pub last_seen: HexCoord,
}

impl IntelPath {
    /// Condense a detection ledger; `None` if the unit was never seen
    pub fn from_ledger(unit: &Unit, turn: Turn, ledger: &BTreeMap<TickTime, HexCoord>) -> Option<Self> {
        let (_, first_seen) = ledger.first_key_value()?;
        let (_, last_seen) = ledger.last_key_value()?;
        Some(Self {
            side: unit.side,
            unit_id: unit.id.clone(),
            turn,
            first_seen: *first_seen,
            last_seen: *last_seen,
        })
    }
}

/// What one side knows about the other
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideIntel {
    pub markers: BTreeMap<UnitId, IntelMarker>,
    pub paths: BTreeMap<UnitId, IntelPath>,
}

impl SideIntel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh markers from this turn's visible cells
    ///
    /// Active enemies standing in a visible cell are re-sighted with a full
    /// `ttl`; every other known marker decays by one turn.
    pub fn update_markers<'a>(
        &mut self,
        enemies: impl IntoIterator<Item = &'a Unit>,
        visible: &AHashSet<HexCoord>,
        ttl: u32,
    ) {
        let mut sighted = BTreeSet::new();
        for enemy in enemies {
            if enemy.is_active() && visible.contains(&enemy.pos) {
                self.markers
                    .insert(enemy.id.clone(), IntelMarker::sighted(enemy.pos, ttl));
                sighted.insert(enemy.id.clone());
            }
        }
        for (id, marker) in self.markers.iter_mut() {
            if !sighted.contains(id) {
                marker.decay();
            }
        }
    }

    /// Markers still worth reporting
    pub fn live_markers(&self) -> impl Iterator<Item = (&UnitId, &IntelMarker)> {
        self.markers.iter().filter(|(_, m)| m.is_live())
    }

    pub fn record_path(&mut self, path: IntelPath) {
        self.paths.insert(path.unit_id.clone(), path);
    }

    /// Drop paths older than `retention` turns
    pub fn prune_paths(&mut self, turn: Turn, retention: u32) {
        self.paths
            .retain(|_, path| turn.saturating_sub(path.turn) < retention);
    }
}
