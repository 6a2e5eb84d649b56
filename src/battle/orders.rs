//! Player orders and their validation
//!
//! Orders are checked against the board before a turn is resolved; every
//! problem is reported, not just the first.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::battle_map::HexGrid;
use crate::battle::hex::HexCoord;
use crate::battle::units::{SquadronState, Unit};
use crate::core::types::Side;

/// One side's orders for a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOrders {
    /// New destination for the carrier
    #[serde(default)]
    pub carrier_target: Option<HexCoord>,
    /// Strike target for the next available squadron
    #[serde(default)]
    pub launch_target: Option<HexCoord>,
}

impl PlayerOrders {
    /// No new orders; units keep their current targets
    pub fn hold() -> Self {
        Self::default()
    }

    pub fn move_carrier(target: HexCoord) -> Self {
        Self {
            carrier_target: Some(target),
            launch_target: None,
        }
    }

    pub fn launch(target: HexCoord) -> Self {
        Self {
            carrier_target: None,
            launch_target: Some(target),
        }
    }

    pub fn with_launch(mut self, target: HexCoord) -> Self {
        self.launch_target = Some(target);
        self
    }
}

/// Why an order was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderRejection {
    #[error("Carrier not found or sunk.")]
    CarrierUnavailable,

    #[error("Carrier target {0} out of map bounds.")]
    CarrierTargetOutOfBounds(HexCoord),

    #[error("Carrier target {0} is not on sea.")]
    CarrierTargetNotSea(HexCoord),

    #[error("No available squadron to launch.")]
    NoSquadronAvailable,

    #[error("Launch target {0} out of map bounds.")]
    LaunchTargetOutOfBounds(HexCoord),

    #[error("Launch target {0} is not on sea.")]
    LaunchTargetNotSea(HexCoord),

    #[error("Launch target {target} is out of squadron range ({distance} > {fuel}).")]
    LaunchTargetOutOfRange {
        target: HexCoord,
        distance: u32,
        fuel: u32,
    },
}

/// The side's carrier, if any
pub fn side_carrier(units: &[Unit], side: Side) -> Option<&Unit> {
    units.iter().find(|u| u.side == side && u.is_carrier())
}

/// Number of the side's squadrons currently in the air
pub fn airborne_count(units: &[Unit], side: Side) -> u32 {
    units
        .iter()
        .filter(|u| u.side == side && u.squadron_state().is_some_and(|s| s.is_airborne()))
        .count() as u32
}

/// First hangared squadron that can fly, if the carrier has deck room
pub fn launchable_squadron(units: &[Unit], side: Side) -> Option<usize> {
    let carrier = side_carrier(units, side).filter(|c| c.is_active())?;
    if airborne_count(units, side) >= carrier.hangar().unwrap_or(0) {
        return None;
    }
    units.iter().position(|u| {
        u.side == side && u.hp > 0 && u.squadron_state() == Some(SquadronState::Base)
    })
}

fn check_destination(
    grid: &HexGrid,
    target: HexCoord,
    out_of_bounds: fn(HexCoord) -> OrderRejection,
    not_sea: fn(HexCoord) -> OrderRejection,
) -> Option<OrderRejection> {
    if !grid.in_bounds(target) {
        Some(out_of_bounds(target))
    } else if !grid.is_sea(target) {
        Some(not_sea(target))
    } else {
        None
    }
}

/// Validate one side's orders; an empty result means the orders are accepted
pub fn validate_orders(
    grid: &HexGrid,
    units: &[Unit],
    side: Side,
    orders: &PlayerOrders,
) -> Vec<OrderRejection> {
    let mut rejections = Vec::new();
    let carrier = side_carrier(units, side).filter(|c| c.is_active());

    if let Some(target) = orders.carrier_target {
        if carrier.is_none() {
            rejections.push(OrderRejection::CarrierUnavailable);
            return rejections;
        }
        rejections.extend(check_destination(
            grid,
            target,
            OrderRejection::CarrierTargetOutOfBounds,
            OrderRejection::CarrierTargetNotSea,
        ));
    }

    if let Some(target) = orders.launch_target {
        let (Some(carrier), Some(idx)) = (carrier, launchable_squadron(units, side)) else {
            rejections.push(OrderRejection::NoSquadronAvailable);
            return rejections;
        };
        if let Some(rejection) = check_destination(
            grid,
            target,
            OrderRejection::LaunchTargetOutOfBounds,
            OrderRejection::LaunchTargetNotSea,
        ) {
            rejections.push(rejection);
        } else {
            let fuel = units[idx].fuel().unwrap_or(0);
            let distance = carrier.pos.distance(&target);
            if distance > fuel {
                rejections.push(OrderRejection::LaunchTargetOutOfRange {
                    target,
                    distance,
                    fuel,
                });
            }
        }
    }

    rejections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::Terrain;
    use crate::battle::units::side_roster;

    fn setup() -> (HexGrid, Vec<Unit>) {
        let mut grid = HexGrid::new(30, 30);
        grid.set_terrain(HexCoord::new(10, 10), Terrain::Land);
        let mut units = side_roster(Side::A, HexCoord::new(3, 3));
        units.extend(side_roster(Side::B, HexCoord::new(26, 26)));
        (grid, units)
    }

    #[test]
    fn test_hold_is_valid() {
        let (grid, units) = setup();
        assert!(validate_orders(&grid, &units, Side::A, &PlayerOrders::hold()).is_empty());
    }

    #[test]
    fn test_carrier_target_checks() {
        let (grid, units) = setup();
        let land = validate_orders(&grid, &units, Side::A, &PlayerOrders::move_carrier(HexCoord::new(10, 10)));
        assert_eq!(land, vec![OrderRejection::CarrierTargetNotSea(HexCoord::new(10, 10))]);

        let off = validate_orders(&grid, &units, Side::A, &PlayerOrders::move_carrier(HexCoord::new(30, 0)));
        assert_eq!(off, vec![OrderRejection::CarrierTargetOutOfBounds(HexCoord::new(30, 0))]);
    }

    #[test]
    fn test_launch_range_check() {
        let (grid, units) = setup();
        let far = PlayerOrders::launch(HexCoord::new(26, 26));
        let result = validate_orders(&grid, &units, Side::A, &far);
        assert!(matches!(
            result.as_slice(),
            [OrderRejection::LaunchTargetOutOfRange { fuel: 22, .. }]
        ));
        assert!(validate_orders(&grid, &units, Side::A, &PlayerOrders::launch(HexCoord::new(12, 12))).is_empty());
    }

    #[test]
    fn test_sunk_carrier_rejects_everything() {
        let (grid, mut units) = setup();
        units[0].take_damage(200);
        let orders = PlayerOrders::move_carrier(HexCoord::new(5, 5));
        assert_eq!(
            validate_orders(&grid, &units, Side::A, &orders),
            vec![OrderRejection::CarrierUnavailable]
        );
        let launch = PlayerOrders::launch(HexCoord::new(5, 5));
        assert_eq!(
            validate_orders(&grid, &units, Side::A, &launch),
            vec![OrderRejection::NoSquadronAvailable]
        );
    }

    #[test]
    fn test_no_squadron_when_all_airborne() {
        let (grid, mut units) = setup();
        for u in units.iter_mut().filter(|u| u.side == Side::A && u.is_squadron()) {
            u.set_squadron_state(SquadronState::Outbound);
            u.pos = HexCoord::new(4, 4);
        }
        assert_eq!(airborne_count(&units, Side::A), 2);
        assert!(launchable_squadron(&units, Side::A).is_none());
        let result = validate_orders(&grid, &units, Side::A, &PlayerOrders::launch(HexCoord::new(6, 6)));
        assert_eq!(result, vec![OrderRejection::NoSquadronAvailable]);
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            OrderRejection::CarrierTargetNotSea(HexCoord::new(1, 2)).to_string(),
            "Carrier target (1,2) is not on sea."
        );
    }
}
