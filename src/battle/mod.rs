//! Naval battle engine - carriers, squadrons and fog of war on a hex sea
//!
//! Two battle groups trade blind air strikes:
//! - Ships keep to open water; aircraft overfly islands
//! - Faster units get more movement ticks within a turn
//! - Enemies are only known through sightings that fade with time

pub mod battle_map;
pub mod constants;
pub mod execution;
pub mod hex;
pub mod mapgen;
pub mod orders;
pub mod pathfinding;
pub mod resolution;
pub mod terrain;
pub mod units;
pub mod visibility;

// Re-exports for convenient access
pub use battle_map::HexGrid;
pub use constants::*;
pub use execution::{
    GameBoard, GameStatus, NavalEvent, NavalEventType, TurnOutcome, TurnReport, UnitTrack,
    UnitView,
};
pub use hex::HexCoord;
pub use mapgen::{generate_connected_map, spawn_point, spawn_points};
pub use orders::{validate_orders, OrderRejection, PlayerOrders};
pub use pathfinding::{find_path, DistanceField, Passability};
pub use resolution::{resolve_strike, scaled_damage, StrikeOutcome};
pub use terrain::Terrain;
pub use units::{side_roster, SquadronState, Unit, UnitKind};
pub use visibility::{side_visible_cells, IntelMarker, IntelPath, SideIntel};
