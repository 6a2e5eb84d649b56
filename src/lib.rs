//! Carrier War - turn-based carrier battles on a hex sea
//!
//! Two players each command a carrier and its squadrons. Orders are
//! submitted simultaneously, then the engine resolves movement, detection
//! and air strikes for both sides at once.

pub mod battle;
pub mod core;
pub mod lobby;
