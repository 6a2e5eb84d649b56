//! Naval units: carriers and their squadrons
//!
//! Units are created once per match and never removed. Destroyed units keep
//! their roster slot with hp <= 0, `Lost` state, or an invalid position.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    CARRIER_HANGAR, CARRIER_HP, CARRIER_SPEED, CARRIER_VISION, SQUADRONS_PER_SIDE, SQUADRON_FUEL,
    SQUADRON_HP, SQUADRON_SPEED, SQUADRON_VISION,
};
use crate::battle::hex::HexCoord;
use crate::core::types::{Side, UnitId};

/// Flight state of a squadron
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SquadronState {
    #[default]
    Base,      // In the hangar
    Outbound,  // Flying to its strike target
    Engaging,  // Next to an enemy carrier, strikes next turn
    Returning, // Flying home
    Lost,      // Shot down
}

impl SquadronState {
    /// Legal state machine edges
    pub fn can_transition_to(&self, next: SquadronState) -> bool {
        use SquadronState::*;
        matches!(
            (self, next),
            (Base, Outbound)
                | (Outbound, Engaging)
                | (Outbound, Returning)
                | (Engaging, Returning)
                | (Returning, Base)
                | (Outbound, Lost)
                | (Engaging, Lost)
                | (Returning, Lost)
        )
    }

    /// Is the squadron in the air?
    pub fn is_airborne(&self) -> bool {
        matches!(
            self,
            SquadronState::Outbound | SquadronState::Engaging | SquadronState::Returning
        )
    }
}

/// Variant-specific data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitKind {
    Carrier { hangar: u32 },
    Squadron { fuel: u32, state: SquadronState },
}

/// A carrier or squadron
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub side: Side,
    pub pos: HexCoord,
    pub hp: i32,
    pub max_hp: i32,
    /// Hexes per turn
    pub speed: u32,
    /// Detection radius in hex distance
    pub vision: u32,
    pub target: Option<HexCoord>,
    pub kind: UnitKind,
}

impl Unit {
    /// A carrier at its spawn position, holding station
    pub fn carrier(side: Side, n: u32, pos: HexCoord) -> Self {
        Self {
            id: UnitId::carrier(side, n),
            side,
            pos,
            hp: CARRIER_HP,
            max_hp: CARRIER_HP,
            speed: CARRIER_SPEED,
            vision: CARRIER_VISION,
            target: None,
            kind: UnitKind::Carrier {
                hangar: CARRIER_HANGAR,
            },
        }
    }

    /// A squadron waiting in its carrier's hangar
    pub fn squadron(side: Side, n: u32) -> Self {
        Self {
            id: UnitId::squadron(side, n),
            side,
            pos: HexCoord::INVALID,
            hp: SQUADRON_HP,
            max_hp: SQUADRON_HP,
            speed: SQUADRON_SPEED,
            vision: SQUADRON_VISION,
            target: None,
            kind: UnitKind::Squadron {
                fuel: SQUADRON_FUEL,
                state: SquadronState::Base,
            },
        }
    }

    pub fn is_carrier(&self) -> bool {
        matches!(self.kind, UnitKind::Carrier { .. })
    }

    pub fn is_squadron(&self) -> bool {
        matches!(self.kind, UnitKind::Squadron { .. })
    }

    /// On the map and able to act
    pub fn is_active(&self) -> bool {
        if self.hp <= 0 || !self.pos.is_valid() {
            return false;
        }
        match self.kind {
            UnitKind::Carrier { .. } => true,
            UnitKind::Squadron { state, .. } => state.is_airborne(),
        }
    }

    pub fn squadron_state(&self) -> Option<SquadronState> {
        match self.kind {
            UnitKind::Squadron { state, .. } => Some(state),
            UnitKind::Carrier { .. } => None,
        }
    }

    pub fn fuel(&self) -> Option<u32> {
        match self.kind {
            UnitKind::Squadron { fuel, .. } => Some(fuel),
            UnitKind::Carrier { .. } => None,
        }
    }

    pub fn hangar(&self) -> Option<u32> {
        match self.kind {
            UnitKind::Carrier { hangar } => Some(hangar),
            UnitKind::Squadron { .. } => None,
        }
    }

    /// Move a squadron along its state machine
    ///
    /// Leaving the air clears position and target.
    pub fn set_squadron_state(&mut self, next: SquadronState) {
        if let UnitKind::Squadron { state, .. } = &mut self.kind {
            debug_assert!(
                state.can_transition_to(next),
                "illegal squadron transition {:?} -> {:?} for {}",
                state,
                next,
                self.id
            );
            *state = next;
            if !next.is_airborne() {
                self.pos = HexCoord::INVALID;
                self.target = None;
            }
        }
    }

    /// Apply damage (hp floors at 0); returns true if this destroyed the unit
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.hp > 0;
        self.hp = (self.hp - amount.max(0)).max(0);
        if was_alive && self.hp <= 0 {
            if self.is_carrier() {
                self.pos = HexCoord::INVALID;
                self.target = None;
            } else {
                self.set_squadron_state(SquadronState::Lost);
            }
            return true;
        }
        false
    }
}

/// Build one side's battle group: a carrier followed by its squadrons
pub fn side_roster(side: Side, carrier_pos: HexCoord) -> Vec<Unit> {
    let mut units = vec![Unit::carrier(side, 1, carrier_pos)];
    units.extend((1..=SQUADRONS_PER_SIDE).map(|n| Unit::squadron(side, n)));
    units
}
