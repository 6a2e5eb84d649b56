//! Naval battle constants - unit statistics and scheduler scale
//!
//! Map and combat tunables that vary per match live in `EngineConfig`.

// Time
/// Virtual time units per turn; a unit with speed `s` moves every `TICK_SCALE / s`
pub const TICK_SCALE: u32 = 1000;

// Carrier
pub const CARRIER_HP: i32 = 100;
pub const CARRIER_SPEED: u32 = 2; // hexes per turn
pub const CARRIER_VISION: u32 = 4;
pub const CARRIER_HANGAR: u32 = 2; // squadrons airborne at once

// Squadron
pub const SQUADRON_HP: i32 = 40;
pub const SQUADRON_SPEED: u32 = 4;
pub const SQUADRON_VISION: u32 = 5;
pub const SQUADRON_FUEL: u32 = 22; // max launch distance in hexes

/// Squadrons carried per side
pub const SQUADRONS_PER_SIDE: u32 = 2;

// Ranges
/// Strike and engagement distance between a squadron and a carrier
pub const STRIKE_RANGE: u32 = 1;
/// Distance at which a returning squadron lands on its carrier
pub const LANDING_RANGE: u32 = 1;

/// Damage roll spread as a fraction of the base (+/- 20%)
pub const DAMAGE_VARIANCE: f32 = 0.2;
