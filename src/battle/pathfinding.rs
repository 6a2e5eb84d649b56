//! Distance fields and A* pathfinding on the sea map
//!
//! Both planners share one `Passability` predicate so they always agree on
//! which cells can be entered.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::f32::consts::PI;

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use crate::battle::battle_map::HexGrid;
use crate::battle::hex::HexCoord;

/// Which cells a mover may enter
#[derive(Debug, Clone, Default)]
pub struct Passability {
    /// Aircraft fly over land; ships do not
    pub pass_islands: bool,
    /// Cells held by other units
    pub blocked: AHashSet<HexCoord>,
    /// Cell the mover should not revisit this step
    pub avoid: Option<HexCoord>,
}

impl Passability {
    pub fn ships() -> Self {
        Self::default()
    }

    pub fn aircraft() -> Self {
        Self {
            pass_islands: true,
            ..Self::default()
        }
    }

    pub fn with_blocked(mut self, blocked: impl IntoIterator<Item = HexCoord>) -> Self {
        self.blocked.extend(blocked);
        self
    }

    pub fn with_avoid(mut self, avoid: Option<HexCoord>) -> Self {
        self.avoid = avoid;
        self
    }

    /// Same rule without the do-not-revisit cell
    pub fn without_avoid(&self) -> Self {
        Self {
            avoid: None,
            ..self.clone()
        }
    }

    pub fn allows(&self, grid: &HexGrid, coord: HexCoord) -> bool {
        grid.is_passable(coord, self.pass_islands)
            && !self.blocked.contains(&coord)
            && self.avoid != Some(coord)
    }
}

/// Wavefront distances (in steps) to the nearest cell within `stop_range` of a goal
#[derive(Debug, Clone)]
pub struct DistanceField {
    width: u32,
    height: u32,
    goal: HexCoord,
    stop_range: u32,
    values: Vec<u32>,
}

impl DistanceField {
    /// Marker for cells the wavefront never reached
    pub const UNREACHABLE: u32 = u32::MAX;

    /// Multi-source BFS seeded from every passable cell within `stop_range` of `goal`
    pub fn build(grid: &HexGrid, goal: HexCoord, passability: &Passability, stop_range: u32) -> Self {
        let mut field = Self {
            width: grid.width,
            height: grid.height,
            goal,
            stop_range,
            values: vec![Self::UNREACHABLE; grid.width as usize * grid.height as usize],
        };

        let mut frontier = VecDeque::new();
        for source in grid.hexes_in_range(goal, stop_range) {
            if passability.allows(grid, source) {
                field.set(source, 0);
                frontier.push_back(source);
            }
        }

        while let Some(current) = frontier.pop_front() {
            let next = field.raw(current).saturating_add(1);
            for n in grid.neighbors(current) {
                if field.raw(n) == Self::UNREACHABLE && passability.allows(grid, n) {
                    field.set(n, next);
                    frontier.push_back(n);
                }
            }
        }

        field
    }

    fn index(&self, coord: HexCoord) -> Option<usize> {
        if coord.x >= 0
            && coord.y >= 0
            && coord.x < self.width as i32
            && coord.y < self.height as i32
        {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    fn raw(&self, coord: HexCoord) -> u32 {
        self.index(coord)
            .map(|i| self.values[i])
            .unwrap_or(Self::UNREACHABLE)
    }

    fn set(&mut self, coord: HexCoord, value: u32) {
        if let Some(i) = self.index(coord) {
            self.values[i] = value;
        }
    }

    /// Steps from `coord` to the goal region, if reachable
    pub fn get(&self, coord: HexCoord) -> Option<u32> {
        match self.raw(coord) {
            Self::UNREACHABLE => None,
            v => Some(v),
        }
    }

    pub fn reaches(&self, coord: HexCoord) -> bool {
        self.get(coord).is_some()
    }

    /// Descend the field from `start`, preferring steps that point at the goal
    ///
    /// The returned path includes `start`. Returns `None` when `start` is
    /// not reached by the field.
    pub fn gradient_path(&self, start: HexCoord) -> Option<Vec<HexCoord>> {
        let mut current_value = self.get(start)?;
        let mut current = start;
        let mut path = vec![start];

        while current_value > 0 && current.distance(&self.goal) > self.stop_range {
            let bearing = current.angle_to(&self.goal);
            let next = current
                .neighbors()
                .into_iter()
                .filter_map(|n| self.get(n).filter(|v| *v < current_value).map(|v| (n, v)))
                .min_by_key(|(n, v)| (*v, OrderedFloat(angular_deviation(bearing, current.angle_to(n)))));

            let Some((step, value)) = next else {
                break;
            };
            path.push(step);
            current = step;
            current_value = value;
        }

        Some(path)
    }
}

/// Absolute difference between two bearings, in [0, PI]
fn angular_deviation(a: f32, b: f32) -> f32 {
    let mut d = (a - b).abs() % (2.0 * PI);
    if d > PI {
        d = 2.0 * PI - d;
    }
    d
}

/// Node in the A* open set
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    coord: HexCoord,
    g_cost: u32,
    f_cost: u32, // g_cost + heuristic
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; prefer deeper nodes, then lower coords
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find path using A* algorithm
///
/// The search ends at the first cell within `stop_range` of `goal`; the
/// returned path includes `start`. Returns `None` if `start` cannot be
/// entered, no path exists, or more than `budget` nodes are expanded.
pub fn find_path(
    grid: &HexGrid,
    start: HexCoord,
    goal: HexCoord,
    passability: &Passability,
    stop_range: u32,
    budget: u32,
) -> Option<Vec<HexCoord>> {
    if !passability.allows(grid, start) {
        return None;
    }
    let heuristic = |c: HexCoord| c.distance(&goal).saturating_sub(stop_range);

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<HexCoord, HexCoord> = AHashMap::new();
    let mut g_scores: AHashMap<HexCoord, u32> = AHashMap::new();
    let mut closed: AHashSet<HexCoord> = AHashSet::new();
    let mut expansions = 0u32;

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        g_cost: 0,
        f_cost: heuristic(start),
    });

    while let Some(current) = open_set.pop() {
        if current.coord.distance(&goal) <= stop_range {
            return Some(reconstruct_path(&came_from, current.coord));
        }
        if !closed.insert(current.coord) {
            continue;
        }

        expansions += 1;
        if expansions > budget {
            return None;
        }

        let tentative_g = current.g_cost + 1;
        for neighbor in grid.neighbors(current.coord) {
            if closed.contains(&neighbor) || !passability.allows(grid, neighbor) {
                continue;
            }

            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(u32::MAX);
            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    coord: neighbor,
                    g_cost: tentative_g,
                    f_cost: tentative_g + heuristic(neighbor),
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &AHashMap<HexCoord, HexCoord>, mut current: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::Terrain;

    const BUDGET: u32 = 20_000;

    fn wall_map(gap: bool) -> HexGrid {
        let mut grid = HexGrid::new(5, 5);
        for x in 0..5 {
            if !(gap && x == 2) {
                grid.set_terrain(HexCoord::new(x, 2), Terrain::Land);
            }
        }
        grid
    }

    #[test]
    fn test_straight_line_path() {
        let grid = HexGrid::new(10, 10);
        let start = HexCoord::new(0, 0);
        let goal = HexCoord::new(5, 0);
        let path = find_path(&grid, start, goal, &Passability::ships(), 0, BUDGET).unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_path_through_gap() {
        let grid = wall_map(true);
        let path = find_path(
            &grid,
            HexCoord::new(0, 0),
            HexCoord::new(4, 4),
            &Passability::ships(),
            0,
            BUDGET,
        )
        .unwrap();
        assert!(path.contains(&HexCoord::new(2, 2)));
        assert!(path.iter().all(|c| grid.is_sea(*c)));
    }

    #[test]
    fn test_aircraft_cross_closed_wall() {
        let grid = wall_map(false);
        let start = HexCoord::new(0, 0);
        let goal = HexCoord::new(4, 4);
        assert!(find_path(&grid, start, goal, &Passability::ships(), 0, BUDGET).is_none());
        assert!(find_path(&grid, start, goal, &Passability::aircraft(), 0, BUDGET).is_some());
    }

    #[test]
    fn test_stop_range_ends_adjacent() {
        let grid = HexGrid::new(10, 10);
        let goal = HexCoord::new(6, 6);
        let pass = Passability::ships().with_blocked([goal]);
        let path = find_path(&grid, HexCoord::new(0, 0), goal, &pass, 1, BUDGET).unwrap();
        assert_eq!(path.last().map(|c| c.distance(&goal)), Some(1));
    }

    #[test]
    fn test_blocked_start_has_no_path() {
        let grid = HexGrid::new(5, 5);
        let start = HexCoord::new(1, 1);
        let pass = Passability::ships().with_avoid(Some(start));
        assert!(find_path(&grid, start, HexCoord::new(3, 3), &pass, 0, BUDGET).is_none());
        assert!(find_path(&grid, start, HexCoord::new(3, 3), &pass.without_avoid(), 0, BUDGET).is_some());
    }

    #[test]
    fn test_budget_exhaustion() {
        let grid = HexGrid::new(30, 30);
        let result = find_path(
            &grid,
            HexCoord::new(0, 0),
            HexCoord::new(29, 29),
            &Passability::ships(),
            0,
            3,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_distance_field_values() {
        let grid = HexGrid::new(10, 10);
        let goal = HexCoord::new(5, 5);
        let field = DistanceField::build(&grid, goal, &Passability::ships(), 0);
        assert_eq!(field.get(goal), Some(0));
        for n in goal.neighbors() {
            assert_eq!(field.get(n), Some(1));
        }
        assert_eq!(field.get(HexCoord::new(0, 5)), Some(5));
        assert!(!field.reaches(HexCoord::INVALID));
    }

    #[test]
    fn test_distance_field_respects_wall() {
        let grid = wall_map(false);
        let field = DistanceField::build(&grid, HexCoord::new(4, 4), &Passability::ships(), 0);
        assert!(!field.reaches(HexCoord::new(0, 0)));
        assert!(field.reaches(HexCoord::new(0, 3)));
    }

    #[test]
    fn test_gradient_path_descends() {
        let grid = wall_map(true);
        let goal = HexCoord::new(4, 4);
        let field = DistanceField::build(&grid, goal, &Passability::ships(), 0);
        let path = field.gradient_path(HexCoord::new(0, 0)).unwrap();
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert_eq!(pair[0].distance(&pair[1]), 1);
            assert!(field.get(pair[1]) < field.get(pair[0]));
        }
    }

    #[test]
    fn test_gradient_path_unreachable() {
        let grid = wall_map(false);
        let field = DistanceField::build(&grid, HexCoord::new(4, 4), &Passability::ships(), 0);
        assert!(field.gradient_path(HexCoord::new(0, 0)).is_none());
    }

    #[test]
    fn test_planners_agree_on_reachability() {
        let grid = wall_map(false);
        let goal = HexCoord::new(1, 4);
        let pass = Passability::ships();
        let field = DistanceField::build(&grid, goal, &pass, 0);
        for start in grid.sea_cells() {
            let path = find_path(&grid, start, goal, &pass, 0, BUDGET);
            assert_eq!(path.is_some(), field.reaches(start), "{start}");
            if let Some(path) = path {
                assert_eq!(field.get(start), Some(path.len() as u32 - 1));
            }
        }
    }

    #[test]
    fn test_angular_deviation_wraps() {
        assert!((angular_deviation(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-5);
        assert_eq!(angular_deviation(1.0, 1.0), 0.0);
    }
}
