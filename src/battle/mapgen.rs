//! Sea map generation
//!
//! Scatters filled land disks over open water, carves the carrier spawn
//! corners back to sea, and retries until every sea cell is reachable.

use rand::Rng;
use tracing::{debug, warn};

use crate::battle::battle_map::HexGrid;
use crate::battle::hex::HexCoord;
use crate::battle::terrain::Terrain;
use crate::core::config::EngineConfig;
use crate::core::types::Side;

/// Radius of open water kept around each carrier start
pub const SPAWN_CLEARANCE: u32 = 1;

/// Carrier start positions: near opposite corners of the map
pub fn spawn_points(width: u32, height: u32) -> [HexCoord; 2] {
    let inset = |len: u32| 3.min(len as i32 / 2);
    let (ix, iy) = (inset(width), inset(height));
    [
        HexCoord::new(ix, iy),
        HexCoord::new(width as i32 - 1 - ix, height as i32 - 1 - iy),
    ]
}

/// Start position for one side
pub fn spawn_point(side: Side, width: u32, height: u32) -> HexCoord {
    spawn_points(width, height)[side.index()]
}

/// Scatter one round of land blobs on an all-sea map
fn scatter_blobs(config: &EngineConfig, rng: &mut impl Rng) -> HexGrid {
    let mut grid = HexGrid::new(config.map_width, config.map_height);
    for _ in 0..config.land_blobs {
        let center = HexCoord::new(
            rng.gen_range(0..config.map_width as i32),
            rng.gen_range(0..config.map_height as i32),
        );
        let radius = rng.gen_range(config.blob_radius_min..=config.blob_radius_max);
        for coord in grid.hexes_in_range(center, radius) {
            grid.set_terrain(coord, Terrain::Land);
        }
    }
    grid
}

fn carve_spawns(grid: &mut HexGrid, spawns: &[HexCoord]) {
    for spawn in spawns {
        for coord in grid.hexes_in_range(*spawn, SPAWN_CLEARANCE) {
            grid.set_terrain(coord, Terrain::Sea);
        }
    }
}

/// Generate a map whose sea region is connected
///
/// Gives up after `map_max_attempts` and returns the last candidate so that
/// match creation never stalls.
pub fn generate_connected_map(
    config: &EngineConfig,
    rng: &mut impl Rng,
    spawns: &[HexCoord],
) -> HexGrid {
    let attempts = config.map_max_attempts.max(1);
    let mut grid = HexGrid::new(config.map_width, config.map_height);

    for attempt in 1..=attempts {
        grid = scatter_blobs(config, rng);
        carve_spawns(&mut grid, spawns);
        if grid.validate_sea_connectivity() {
            debug!(attempt, "generated connected sea map");
            return grid;
        }
    }

    warn!(
        attempts,
        "no connected sea map found, using last candidate"
    );
    grid
}
