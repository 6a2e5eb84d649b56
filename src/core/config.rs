//! Engine configuration with documented constants
//!
//! Tunables for map generation, turn limits, intel memory and combat. Unit
//! statistics (speed, vision, hit points) live in `battle::constants`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{CarrierError, Result};

/// Largest accepted map width or height
pub const MAX_MAP_SIDE: u32 = 512;

/// Configuration for the turn engine and map generator
///
/// Every field has a default, so a TOML file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === MAP ===
    /// Map width in hexes
    pub map_width: u32,

    /// Map height in hexes
    pub map_height: u32,

    /// Number of land blobs scattered over the open sea
    ///
    /// More blobs means more islands to route around and a higher chance
    /// that a generated map fails the sea connectivity check.
    pub land_blobs: u32,

    /// Smallest blob radius (hex distance from blob centre)
    pub blob_radius_min: u32,

    /// Largest blob radius (inclusive)
    pub blob_radius_max: u32,

    /// How many maps to generate before giving up on connectivity
    ///
    /// When every attempt fails the last map is used anyway so match
    /// creation never stalls.
    pub map_max_attempts: u32,

    // === TURNS ===
    /// Hard ceiling on resolved turns
    ///
    /// When reached, the side whose carrier has more hp wins.
    pub max_turns: u32,

    // === INTEL ===
    /// Turns a sighting stays fresh before the marker goes stale
    pub intel_ttl: u32,

    /// Turns an intel path stays in a side's report
    pub intel_retention_turns: u32,

    // === PATHFINDING ===
    /// Node expansions A* may perform before reporting "no path"
    ///
    /// A full 30x30 map has 900 cells, so the default leaves a wide margin.
    pub astar_expansion_budget: u32,

    // === COMBAT ===
    /// Damage a full-strength squadron deals to a carrier
    pub strike_damage_base: i32,

    /// Anti-air damage a full-strength carrier deals to an attacking squadron
    pub anti_air_damage_base: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_width: 30,
            map_height: 30,
            land_blobs: 10,
            blob_radius_min: 1,
            blob_radius_max: 3,
            map_max_attempts: 32,

            max_turns: 30,

            intel_ttl: 3,
            intel_retention_turns: 3,

            astar_expansion_budget: 20_000,

            strike_damage_base: 25,
            anti_air_damage_base: 20,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        // Two carriers need room for their spawn corners
        if self.map_width < 5 || self.map_height < 5 {
            return Err(CarrierError::Config(format!(
                "map must be at least 5x5, got {}x{}",
                self.map_width, self.map_height
            )));
        }

        if self.map_width > MAX_MAP_SIDE || self.map_height > MAX_MAP_SIDE {
            return Err(CarrierError::Config(format!(
                "map must be at most {MAX_MAP_SIDE}x{MAX_MAP_SIDE}, got {}x{}",
                self.map_width, self.map_height
            )));
        }

        if self.blob_radius_min > self.blob_radius_max {
            return Err(CarrierError::Config(format!(
                "blob_radius_min ({}) should be <= blob_radius_max ({})",
                self.blob_radius_min, self.blob_radius_max
            )));
        }

        if self.map_max_attempts == 0 {
            return Err(CarrierError::Config("map_max_attempts must be positive".into()));
        }

        if self.max_turns == 0 || self.intel_ttl == 0 {
            return Err(CarrierError::Config(
                "max_turns and intel_ttl must be positive".into(),
            ));
        }

        if self.strike_damage_base < 0 || self.anti_air_damage_base < 0 {
            return Err(CarrierError::Config("damage bases must not be negative".into()));
        }

        Ok(())
    }
}
