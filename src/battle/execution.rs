//! Turn resolution loop
//!
//! Each turn: carrier orders -> strikes -> tick loop (movement + detection)
//! -> engagement checks -> launches -> intel -> termination

use std::collections::{BTreeMap, BTreeSet};

use ahash::{AHashMap, AHashSet};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::battle_map::HexGrid;
use crate::battle::constants::{LANDING_RANGE, STRIKE_RANGE, TICK_SCALE};
use crate::battle::hex::HexCoord;
use crate::battle::mapgen::{generate_connected_map, spawn_points};
use crate::battle::orders::{launchable_squadron, validate_orders, OrderRejection, PlayerOrders};
use crate::battle::pathfinding::{find_path, DistanceField, Passability};
use crate::battle::resolution::resolve_strike;
use crate::battle::units::{side_roster, SquadronState, Unit, UnitKind};
use crate::battle::visibility::{side_visible_cells, IntelMarker, IntelPath, SideIntel};
use crate::core::config::EngineConfig;
use crate::core::error::{CarrierError, Result};
use crate::core::types::{MatchResult, Side, TickTime, Turn, UnitId};

/// Log entry for naval events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavalEvent {
    pub turn: Turn,
    pub time: TickTime,
    pub event_type: NavalEventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavalEventType {
    CarrierOrdered { unit_id: UnitId, target: HexCoord },
    Moved { unit_id: UnitId, from: HexCoord, to: HexCoord },
    Blocked { unit_id: UnitId, target: HexCoord },
    Detected { observer: UnitId, enemy: UnitId, pos: HexCoord },
    Strike { attacker: UnitId, defender: UnitId, damage: i32, anti_air: i32 },
    Sunk { unit_id: UnitId, by: UnitId },
    ShotDown { unit_id: UnitId },
    LostTarget { unit_id: UnitId },
    Engaged { attacker: UnitId, defender: UnitId },
    ReachedTarget { unit_id: UnitId },
    Landed { unit_id: UnitId, carrier: UnitId },
    Launched { unit_id: UnitId, from: HexCoord, target: HexCoord },
    MatchEnded { result: MatchResult },
}

/// Per-turn movement bookkeeping for one unit
#[derive(Debug, Clone, Default)]
pub struct UnitTrack {
    /// Hexes moved this turn
    pub ticks: u32,
    pub next_time: TickTime,
    /// Positions occupied this turn, starting with the turn-start position
    pub path: Vec<HexCoord>,
    /// Where enemies saw this unit: tick time -> position
    pub intel: BTreeMap<TickTime, HexCoord>,
    /// Carrier route preview toward its target
    pub route: Vec<HexCoord>,
}

impl UnitTrack {
    fn reset(&mut self, unit: &Unit) {
        self.ticks = 0;
        self.next_time = 0;
        self.path = if unit.is_active() { vec![unit.pos] } else { Vec::new() };
        self.intel.clear();
        self.route.clear();
    }
}

/// What a side sees of one of its own units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: UnitId,
    pub kind: UnitKind,
    pub hp: i32,
    pub max_hp: i32,
    pub speed: u32,
    pub vision: u32,
    pub pos: Option<HexCoord>,
    pub start_pos: Option<HexCoord>,
    pub target: Option<HexCoord>,
    pub path: Vec<HexCoord>,
    pub route: Vec<HexCoord>,
}

/// One side's view after a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub side: Side,
    pub turn: Turn,
    pub logs: Vec<String>,
    pub units: Vec<UnitView>,
    pub intel_paths: Vec<IntelPath>,
    /// Live intel markers on enemy units
    pub markers: BTreeMap<UnitId, IntelMarker>,
    pub visible: Vec<HexCoord>,
}

/// Terminal status of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    pub over: bool,
    pub result: Option<MatchResult>,
}

/// Everything produced by resolving one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub turn: Turn,
    pub reports: [TurnReport; 2],
    pub events: Vec<NavalEvent>,
    pub status: GameStatus,
}

/// Scratch state for the turn being resolved
struct TurnContext {
    turn: Turn,
    time: TickTime,
    logs: [Vec<String>; 2],
    events: Vec<NavalEvent>,
    sightings: AHashSet<(usize, usize)>,
    /// Position of each unit at the start of the previous turn
    avoid: AHashMap<UnitId, HexCoord>,
}

impl TurnContext {
    fn log(&mut self, side: Side, message: String) {
        self.logs[side.index()].push(message);
    }

    fn event(&mut self, event_type: NavalEventType) {
        self.events.push(NavalEvent {
            turn: self.turn,
            time: self.time,
            event_type,
        });
    }
}

/// Virtual time between two moves of a unit
fn tick_interval(speed: u32) -> TickTime {
    (TICK_SCALE as f32 / speed.max(1) as f32).round() as TickTime
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameBoard {
    pub grid: HexGrid,
    pub units: Vec<Unit>,
    tracks: Vec<UnitTrack>,
    /// Next turn to resolve, starting at 1
    pub turn: Turn,
    pub result: Option<MatchResult>,
    config: EngineConfig,
    intel: [SideIntel; 2],
    visible: [AHashSet<HexCoord>; 2],
    logs: [Vec<String>; 2],
    turn_starts: AHashMap<UnitId, HexCoord>,
}

impl GameBoard {
    /// Build a board from a map and a roster
    ///
    /// Each side needs exactly one carrier, on a sea cell.
    pub fn new(grid: HexGrid, units: Vec<Unit>, config: EngineConfig) -> Result<Self> {
        let mut ids = BTreeSet::new();
        for unit in &units {
            if !ids.insert(unit.id.clone()) {
                return Err(CarrierError::InvariantViolation(format!(
                    "duplicate unit id {}",
                    unit.id
                )));
            }
        }
        for side in Side::BOTH {
            let carriers: Vec<&Unit> = units
                .iter()
                .filter(|u| u.side == side && u.is_carrier())
                .collect();
            let [carrier] = carriers.as_slice() else {
                return Err(CarrierError::InvariantViolation(format!(
                    "side {side} must have exactly one carrier, found {}",
                    carriers.len()
                )));
            };
            if carrier.is_active() && !grid.is_sea(carrier.pos) {
                return Err(CarrierError::InvariantViolation(format!(
                    "carrier {} starts off the sea at {}",
                    carrier.id, carrier.pos
                )));
            }
        }

        let tracks = units
            .iter()
            .map(|u| {
                let mut track = UnitTrack::default();
                track.reset(u);
                track
            })
            .collect();

        let mut board = Self {
            grid,
            units,
            tracks,
            turn: 1,
            result: None,
            config,
            intel: [SideIntel::new(), SideIntel::new()],
            visible: [AHashSet::new(), AHashSet::new()],
            logs: [Vec::new(), Vec::new()],
            turn_starts: AHashMap::new(),
        };
        board.refresh_visibility();
        info!(
            width = board.grid.width,
            height = board.grid.height,
            units = board.units.len(),
            "game board ready"
        );
        Ok(board)
    }

    /// Generate a fresh match: connected map, carriers in opposite corners
    pub fn generate(config: EngineConfig, rng: &mut impl Rng) -> Result<Self> {
        config.validate()?;
        let spawns = spawn_points(config.map_width, config.map_height);
        let grid = generate_connected_map(&config, rng, &spawns);
        let mut units = side_roster(Side::A, spawns[0]);
        units.extend(side_roster(Side::B, spawns[1]));
        Self::new(grid, units, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn intel(&self, side: Side) -> &SideIntel {
        &self.intel[side.index()]
    }

    pub fn visible_cells(&self, side: Side) -> &AHashSet<HexCoord> {
        &self.visible[side.index()]
    }

    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// This turn's path of a unit
    pub fn unit_path(&self, id: &UnitId) -> Option<&[HexCoord]> {
        let idx = self.units.iter().position(|u| &u.id == id)?;
        Some(&self.tracks[idx].path)
    }

    fn carrier_index(&self, side: Side) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.side == side && u.is_carrier())
    }

    pub fn carrier(&self, side: Side) -> Option<&Unit> {
        self.carrier_index(side).map(|i| &self.units[i])
    }

    pub fn squadrons(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.side == side && u.is_squadron())
    }

    pub fn validate_orders(&self, side: Side, orders: &PlayerOrders) -> Vec<OrderRejection> {
        validate_orders(&self.grid, &self.units, side, orders)
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            over: self.is_over(),
            result: self.result,
        }
    }

    /// Resolve one turn from both sides' orders (side A first)
    ///
    /// Nothing is mutated when the call fails.
    pub fn turn_forward(&mut self, orders: &[PlayerOrders], rng: &mut impl Rng) -> Result<TurnOutcome> {
        if self.is_over() {
            return Err(CarrierError::MatchOver);
        }
        let [orders_a, orders_b] = orders else {
            return Err(CarrierError::InvariantViolation(format!(
                "expected orders for 2 sides, got {}",
                orders.len()
            )));
        };
        let orders = [*orders_a, *orders_b];
        for side in Side::BOTH {
            let rejections = self.validate_orders(side, &orders[side.index()]);
            if !rejections.is_empty() {
                return Err(CarrierError::OrdersRejected {
                    side,
                    reasons: rejections.iter().map(|r| r.to_string()).collect(),
                });
            }
        }

        info!(turn = self.turn, "turn start");
        let starts = self
            .units
            .iter()
            .filter(|u| u.is_active())
            .map(|u| (u.id.clone(), u.pos))
            .collect();
        let mut ctx = TurnContext {
            turn: self.turn,
            time: 0,
            logs: [Vec::new(), Vec::new()],
            events: Vec::new(),
            sightings: AHashSet::new(),
            avoid: std::mem::replace(&mut self.turn_starts, starts),
        };
        for (unit, track) in self.units.iter().zip(self.tracks.iter_mut()) {
            track.reset(unit);
        }

        self.apply_carrier_orders(&orders, &mut ctx);
        self.resolve_strikes(&mut ctx, rng);
        self.run_ticks(&mut ctx, rng);
        self.check_engagements(&mut ctx);
        self.launch_squadrons(&orders, &mut ctx);
        self.update_intel(ctx.turn);

        self.result = self.evaluate_result();
        if let Some(result) = self.result {
            info!(turn = self.turn, %result, "match over");
            ctx.event(NavalEventType::MatchEnded { result });
        }

        self.logs = ctx.logs;
        let reports = [self.report(Side::A), self.report(Side::B)];
        let outcome = TurnOutcome {
            turn: self.turn,
            reports,
            events: ctx.events,
            status: self.status(),
        };
        info!(
            turn = self.turn,
            a_hp = self.carrier(Side::A).map(|c| c.hp),
            b_hp = self.carrier(Side::B).map(|c| c.hp),
            "turn resolved"
        );
        self.turn += 1;
        Ok(outcome)
    }

    fn apply_carrier_orders(&mut self, orders: &[PlayerOrders; 2], ctx: &mut TurnContext) {
        for side in Side::BOTH {
            let Some(idx) = self.carrier_index(side) else {
                continue;
            };
            if let Some(target) = orders[side.index()].carrier_target {
                self.units[idx].target = Some(target);
                debug!(unit = %self.units[idx].id, %target, "carrier target set");
                ctx.event(NavalEventType::CarrierOrdered {
                    unit_id: self.units[idx].id.clone(),
                    target,
                });
            }
            self.preview_route(idx);
        }
    }

    /// Gradient route from a carrier to its target, for the owner's report
    fn preview_route(&mut self, idx: usize) {
        let unit = &self.units[idx];
        let Some(target) = unit.target.filter(|_| unit.is_active()) else {
            return;
        };
        let passability = self.passability(idx, &[]);
        let field = DistanceField::build(&self.grid, target, &passability, 0);
        let route = field.gradient_path(unit.pos).unwrap_or_default();
        debug!(unit = %unit.id, steps = route.len().saturating_sub(1), "route preview");
        self.tracks[idx].route = route;
    }

    /// Cells a unit may enter: terrain rule, other active friendlies and
    /// enemies a friendly can currently see are blocked
    fn passability(&self, idx: usize, ignore: &[usize]) -> Passability {
        let mover = &self.units[idx];
        let base = if mover.is_squadron() {
            Passability::aircraft()
        } else {
            Passability::ships()
        };
        let blocked = self.units.iter().enumerate().filter_map(|(j, u)| {
            let relevant = j != idx
                && !ignore.contains(&j)
                && u.is_active()
                && (u.side == mover.side || self.in_sight_of(mover.side, u));
            relevant.then_some(u.pos)
        });
        base.with_blocked(blocked)
    }

    /// Whether an active unit of `side` has `enemy` inside its vision right now
    fn in_sight_of(&self, side: Side, enemy: &Unit) -> bool {
        self.units.iter().any(|o| {
            o.side == side && o.is_active() && o.pos.distance(&enemy.pos) <= o.vision
        })
    }

    fn enemy_carrier_within(&self, idx: usize, range: u32) -> Option<usize> {
        let unit = &self.units[idx];
        self.units.iter().position(|u| {
            u.side != unit.side && u.is_carrier() && u.is_active() && u.pos.distance(&unit.pos) <= range
        })
    }

    fn resolve_strikes(&mut self, ctx: &mut TurnContext, rng: &mut impl Rng) {
        for idx in 0..self.units.len() {
            let unit = &self.units[idx];
            if !unit.is_active() || unit.squadron_state() != Some(SquadronState::Engaging) {
                continue;
            }
            let side = unit.side;
            let own_carrier = self.carrier_index(side);

            match self.enemy_carrier_within(idx, STRIKE_RANGE) {
                Some(carrier_idx) => {
                    let (squadron, carrier) = pair_mut(&mut self.units, idx, carrier_idx);
                    let (sq_pos, carrier_pos) = (squadron.pos, carrier.pos);
                    self.tracks[idx].ticks = squadron.speed;
                    self.tracks[carrier_idx].ticks = carrier.speed;

                    let outcome = resolve_strike(squadron, carrier, &self.config, rng);
                    info!(
                        attacker = %squadron.id,
                        defender = %carrier.id,
                        damage = outcome.damage_to_carrier,
                        anti_air = outcome.anti_air_damage,
                        "strike"
                    );
                    ctx.event(NavalEventType::Strike {
                        attacker: squadron.id.clone(),
                        defender: carrier.id.clone(),
                        damage: outcome.damage_to_carrier,
                        anti_air: outcome.anti_air_damage,
                    });
                    ctx.log(
                        carrier.side,
                        format!(
                            "{}{} was hit by {} for {} damage",
                            carrier.id, carrier_pos, squadron.id, outcome.damage_to_carrier
                        ),
                    );

                    if outcome.carrier_sunk {
                        info!(unit = %carrier.id, by = %squadron.id, "carrier sunk");
                        ctx.log(side, format!("{}{} was sunk by {}{}", carrier.id, carrier_pos, squadron.id, sq_pos));
                        ctx.event(NavalEventType::Sunk {
                            unit_id: carrier.id.clone(),
                            by: squadron.id.clone(),
                        });
                    }
                    if outcome.squadron_lost {
                        info!(unit = %squadron.id, "squadron shot down");
                        ctx.log(side, format!("{}{} was shot down by AA", squadron.id, sq_pos));
                        ctx.event(NavalEventType::ShotDown {
                            unit_id: squadron.id.clone(),
                        });
                        continue;
                    }
                    ctx.log(side, format!("{}{} finished attack and is returning", squadron.id, sq_pos));
                }
                None => {
                    let squadron = &self.units[idx];
                    debug!(unit = %squadron.id, "engaging squadron lost its target");
                    ctx.log(side, format!("{}{} lost its target and is returning", squadron.id, squadron.pos));
                    ctx.event(NavalEventType::LostTarget {
                        unit_id: squadron.id.clone(),
                    });
                }
            }

            let home = own_carrier
                .map(|c| &self.units[c])
                .filter(|c| c.is_active())
                .map(|c| c.pos);
            let squadron = &mut self.units[idx];
            squadron.set_squadron_state(SquadronState::Returning);
            squadron.target = home;
        }
    }

    fn run_ticks(&mut self, ctx: &mut TurnContext, rng: &mut impl Rng) {
        let mut queue: BTreeMap<TickTime, Vec<usize>> = BTreeMap::new();
        for (idx, unit) in self.units.iter().enumerate() {
            let track = &mut self.tracks[idx];
            if unit.is_active() && track.ticks < unit.speed {
                track.next_time = tick_interval(unit.speed);
                queue.entry(track.next_time).or_default().push(idx);
            }
        }

        // Stationary units still spot each other
        self.detect(ctx);

        while let Some((time, mut batch)) = queue.pop_first() {
            ctx.time = time;
            batch.shuffle(rng);
            for idx in batch {
                if self.step_unit(idx, ctx) {
                    let track = &mut self.tracks[idx];
                    track.next_time += tick_interval(self.units[idx].speed);
                    queue.entry(track.next_time).or_default().push(idx);
                }
                self.detect(ctx);
            }
        }
    }

    /// Advance one unit by one hex; returns true if it should be queued again
    fn step_unit(&mut self, idx: usize, ctx: &mut TurnContext) -> bool {
        let unit = &self.units[idx];
        if !unit.is_active() || self.tracks[idx].ticks >= unit.speed {
            return false;
        }

        if unit.squadron_state() == Some(SquadronState::Returning) {
            let carrier_idx = self
                .carrier_index(unit.side)
                .filter(|&c| self.units[c].is_active());
            let Some(carrier_idx) = carrier_idx else {
                // Nowhere to land; hold position
                self.units[idx].target = None;
                return false;
            };
            if self.units[carrier_idx].pos.distance(&unit.pos) <= LANDING_RANGE {
                self.land(idx, carrier_idx, ctx);
                return false;
            }
            self.units[idx].target = Some(self.units[carrier_idx].pos);
        }

        let unit = &self.units[idx];
        let Some(target) = unit.target else {
            return false;
        };
        let stop_range = self.stop_range(idx, target);
        if unit.pos.distance(&target) <= stop_range {
            return false;
        }

        let passability = self
            .passability(idx, &[])
            .with_avoid(ctx.avoid.get(&unit.id).copied());
        let budget = self.config.astar_expansion_budget;
        let path = find_path(&self.grid, unit.pos, target, &passability, stop_range, budget).or_else(|| {
            find_path(&self.grid, unit.pos, target, &passability.without_avoid(), stop_range, budget)
        });

        let Some(next) = path.as_ref().and_then(|p| p.get(1)).copied() else {
            debug!(unit = %unit.id, pos = %unit.pos, %target, "no path, holding");
            ctx.event(NavalEventType::Blocked {
                unit_id: unit.id.clone(),
                target,
            });
            return false;
        };

        let from = unit.pos;
        let unit = &mut self.units[idx];
        unit.pos = next;
        let track = &mut self.tracks[idx];
        track.path.push(next);
        track.ticks += 1;
        debug!(unit = %unit.id, %from, to = %next, time = ctx.time, "moved");
        ctx.event(NavalEventType::Moved {
            unit_id: unit.id.clone(),
            from,
            to: next,
        });

        track.ticks < unit.speed && unit.target.is_some_and(|t| t != unit.pos)
    }

    /// Squadrons chasing or returning to a carrier stop next to it
    fn stop_range(&self, idx: usize, target: HexCoord) -> u32 {
        match self.units[idx].squadron_state() {
            Some(SquadronState::Returning) => LANDING_RANGE,
            Some(SquadronState::Outbound) => self.outbound_stop_range(idx, target),
            _ => 0,
        }
    }

    /// An outbound flight stops next to an enemy carrier, or next to any
    /// cell it is not allowed to enter
    fn outbound_stop_range(&self, idx: usize, target: HexCoord) -> u32 {
        let side = self.units[idx].side;
        let enemy_carrier = self
            .units
            .iter()
            .any(|u| u.side != side && u.is_carrier() && u.is_active() && u.pos == target);
        if enemy_carrier {
            STRIKE_RANGE
        } else if self.passability(idx, &[]).blocked.contains(&target) {
            1
        } else {
            0
        }
    }

    fn land(&mut self, idx: usize, carrier_idx: usize, ctx: &mut TurnContext) {
        let (squadron, carrier) = pair_mut(&mut self.units, idx, carrier_idx);
        info!(unit = %squadron.id, carrier = %carrier.id, "squadron landed");
        ctx.log(
            squadron.side,
            format!(
                "{}{} returned to carrier {}{}",
                squadron.id, squadron.pos, carrier.id, carrier.pos
            ),
        );
        ctx.event(NavalEventType::Landed {
            unit_id: squadron.id.clone(),
            carrier: carrier.id.clone(),
        });
        squadron.set_squadron_state(SquadronState::Base);
        self.tracks[idx].ticks = squadron.speed;
        // Recovering aircraft holds the carrier for the rest of the turn
        self.tracks[carrier_idx].ticks = carrier.speed;
    }

    /// Record every enemy within an active observer's vision into the
    /// enemy's own ledger
    fn detect(&mut self, ctx: &mut TurnContext) {
        let mut found = Vec::new();
        for (i, observer) in self.units.iter().enumerate() {
            if !observer.is_active() {
                continue;
            }
            for (j, enemy) in self.units.iter().enumerate() {
                if enemy.side != observer.side
                    && enemy.is_active()
                    && observer.pos.distance(&enemy.pos) <= observer.vision
                {
                    found.push((i, j));
                }
            }
        }

        for (i, j) in found {
            let enemy_pos = self.units[j].pos;
            let enemy_is_carrier = self.units[j].is_carrier();
            self.tracks[j].intel.insert(ctx.time, enemy_pos);

            let observer = &self.units[i];
            if ctx.sightings.insert((i, j)) {
                let enemy_id = self.units[j].id.clone();
                debug!(observer = %observer.id, enemy = %enemy_id, pos = %enemy_pos, "detected");
                ctx.log(
                    observer.side,
                    format!("{}{} found {}{}", observer.id, observer.pos, enemy_id, enemy_pos),
                );
                ctx.event(NavalEventType::Detected {
                    observer: observer.id.clone(),
                    enemy: enemy_id,
                    pos: enemy_pos,
                });
            }

            let observer = &mut self.units[i];
            if enemy_is_carrier
                && observer.squadron_state() == Some(SquadronState::Outbound)
                && observer.target != Some(enemy_pos)
            {
                debug!(unit = %observer.id, target = %enemy_pos, "retargeting enemy carrier");
                observer.target = Some(enemy_pos);
            }
        }
    }

    fn check_engagements(&mut self, ctx: &mut TurnContext) {
        for idx in 0..self.units.len() {
            let unit = &self.units[idx];
            if !unit.is_active() || unit.squadron_state() != Some(SquadronState::Outbound) {
                continue;
            }

            if let Some(carrier_idx) = self.enemy_carrier_within(idx, STRIKE_RANGE) {
                let carrier = &self.units[carrier_idx];
                ctx.log(
                    unit.side,
                    format!("{}{} is attacking {}{}", unit.id, unit.pos, carrier.id, carrier.pos),
                );
                ctx.event(NavalEventType::Engaged {
                    attacker: unit.id.clone(),
                    defender: carrier.id.clone(),
                });
                debug!(unit = %unit.id, carrier = %carrier.id, "engaging");
                self.units[idx].set_squadron_state(SquadronState::Engaging);
            } else if unit
                .target
                .is_some_and(|t| unit.pos.distance(&t) <= self.outbound_stop_range(idx, t))
            {
                let home = self
                    .carrier(unit.side)
                    .filter(|c| c.is_active())
                    .map(|c| c.pos);
                ctx.log(
                    unit.side,
                    format!("{}{} reached its target and is returning", unit.id, unit.pos),
                );
                ctx.event(NavalEventType::ReachedTarget {
                    unit_id: unit.id.clone(),
                });
                let unit = &mut self.units[idx];
                unit.set_squadron_state(SquadronState::Returning);
                unit.target = home;
            }
        }
    }

    fn launch_squadrons(&mut self, orders: &[PlayerOrders; 2], ctx: &mut TurnContext) {
        for side in Side::BOTH {
            let Some(requested) = orders[side.index()].launch_target else {
                continue;
            };
            let Some(carrier_idx) = self.carrier_index(side).filter(|&c| self.units[c].is_active()) else {
                continue;
            };
            let Some(idx) = launchable_squadron(&self.units, side) else {
                debug!(%side, "no squadron available to launch");
                continue;
            };

            let origin = self.units[carrier_idx].pos;
            let fuel = self.units[idx].fuel().unwrap_or(0) as usize;
            let line = origin.line_to(&requested);
            let target = line.get(fuel).copied().unwrap_or(requested);

            let Some(spawn) = self.launch_cell(idx, carrier_idx, target) else {
                debug!(%side, "no free cell next to the carrier, launch cancelled");
                continue;
            };

            let squadron = &mut self.units[idx];
            squadron.set_squadron_state(SquadronState::Outbound);
            squadron.pos = spawn;
            squadron.target = Some(target);
            self.tracks[idx].path = vec![spawn];

            info!(unit = %squadron.id, from = %origin, %target, "squadron launched");
            ctx.log(side, format!("{}{} launched towards {}", squadron.id, origin, target));
            ctx.event(NavalEventType::Launched {
                unit_id: squadron.id.clone(),
                from: origin,
                target,
            });
        }
    }

    /// First step toward the target, or else the free sea cell next to the
    /// carrier that lies farthest from it
    fn launch_cell(&self, idx: usize, carrier_idx: usize, target: HexCoord) -> Option<HexCoord> {
        let origin = self.units[carrier_idx].pos;
        let passability = self.passability(idx, &[carrier_idx]);
        let step = find_path(
            &self.grid,
            origin,
            target,
            &passability,
            self.outbound_stop_range(idx, target),
            self.config.astar_expansion_budget,
        )
        .and_then(|path| path.get(1).copied());
        if step.is_some() {
            return step;
        }

        self.grid
            .neighbors(origin)
            .filter(|c| self.grid.is_sea(*c) && passability.allows(&self.grid, *c))
            .max_by_key(|c| (c.distance(&target), std::cmp::Reverse(*c)))
    }

    /// Recompute each side's visible cells from current positions and paths
    fn refresh_visibility(&mut self) {
        for side in Side::BOTH {
            let units = self
                .units
                .iter()
                .zip(self.tracks.iter())
                .map(|(u, t)| (u, t.path.as_slice()));
            self.visible[side.index()] = side_visible_cells(&self.grid, side, units);
            let enemies = self.units.iter().filter(|u| u.side != side);
            self.intel[side.index()].update_markers(enemies, &self.visible[side.index()], self.config.intel_ttl);
        }
    }

    fn update_intel(&mut self, turn: Turn) {
        self.refresh_visibility();
        for side in Side::BOTH {
            let intel = &mut self.intel[side.index()];
            for (unit, track) in self.units.iter().zip(self.tracks.iter()) {
                if unit.side == side || !unit.is_active() {
                    continue;
                }
                if let Some(path) = IntelPath::from_ledger(unit, turn, &track.intel) {
                    intel.record_path(path);
                }
            }
            intel.prune_paths(turn, self.config.intel_retention_turns);
        }
    }

    /// Carrier sunk, then squadron wipe, then turn limit
    fn evaluate_result(&self) -> Option<MatchResult> {
        let hp_total = |side: Side, carriers: bool| -> i32 {
            self.units
                .iter()
                .filter(|u| u.side == side && u.is_carrier() == carriers)
                .map(|u| u.hp.max(0))
                .sum()
        };
        let (a_carrier, b_carrier) = (hp_total(Side::A, true), hp_total(Side::B, true));
        let (a_squadrons, b_squadrons) = (hp_total(Side::A, false), hp_total(Side::B, false));

        match (a_carrier <= 0, b_carrier <= 0) {
            (true, true) => return Some(MatchResult::Draw),
            (false, true) => return Some(MatchResult::Winner(Side::A)),
            (true, false) => return Some(MatchResult::Winner(Side::B)),
            (false, false) => {}
        }
        if a_squadrons > 0 && b_squadrons <= 0 {
            return Some(MatchResult::Winner(Side::A));
        }
        if b_squadrons > 0 && a_squadrons <= 0 {
            return Some(MatchResult::Winner(Side::B));
        }
        if self.turn >= self.config.max_turns {
            return Some(match a_carrier.cmp(&b_carrier) {
                std::cmp::Ordering::Greater => MatchResult::Winner(Side::A),
                std::cmp::Ordering::Less => MatchResult::Winner(Side::B),
                std::cmp::Ordering::Equal => MatchResult::Draw,
            });
        }
        None
    }

    /// One side's view of the board: own units in full, enemies through intel
    pub fn report(&self, side: Side) -> TurnReport {
        let units = self
            .units
            .iter()
            .zip(self.tracks.iter())
            .filter(|(u, _)| u.side == side)
            .map(|(u, t)| {
                let active = u.is_active();
                UnitView {
                    id: u.id.clone(),
                    kind: u.kind.clone(),
                    hp: u.hp,
                    max_hp: u.max_hp,
                    speed: u.speed,
                    vision: u.vision,
                    pos: active.then_some(u.pos),
                    start_pos: t.path.first().copied().filter(|_| active),
                    target: u.target.filter(|_| active),
                    path: t.path.clone(),
                    route: t.route.clone(),
                }
            })
            .collect();

        let intel = &self.intel[side.index()];
        let mut visible: Vec<HexCoord> = self.visible[side.index()].iter().copied().collect();
        visible.sort();

        TurnReport {
            side,
            turn: self.turn,
            logs: self.logs[side.index()].clone(),
            units,
            intel_paths: intel.paths.values().cloned().collect(),
            markers: intel
                .live_markers()
                .map(|(id, m)| (id.clone(), *m))
                .collect(),
            visible,
        }
    }
}
