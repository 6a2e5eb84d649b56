//! In-memory registry of matches
//!
//! The map of matches sits behind an `RwLock`; each match has its own
//! `Mutex`, so turns in different matches resolve independently. Every
//! state change is published on the match's `watch` channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::battle::execution::{GameBoard, TurnOutcome};
use crate::battle::orders::{OrderRejection, PlayerOrders};
use crate::core::config::EngineConfig;
use crate::core::error::{CarrierError, Result};
use crate::core::types::{MatchId, PlayerToken, Side, Turn};
use crate::lobby::match_state::{Match, MatchSnapshot, MatchStatus, MatchUpdate};

/// Credentials for a seated player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub match_id: MatchId,
    pub side: Side,
    pub token: PlayerToken,
}

/// Lobby listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub turn: Turn,
    pub players: Vec<String>,
}

/// Result of a successful order submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub status: MatchStatus,
    pub turn: Turn,
    /// Present when this submission completed the turn
    pub outcome: Option<TurnOutcome>,
}

struct MatchEntry {
    state: Mutex<Match>,
    updates: watch::Sender<MatchUpdate>,
}

impl MatchEntry {
    fn lock(&self) -> MutexGuard<'_, Match> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, game: &Match) {
        self.updates.send_replace(game.update());
    }
}

pub struct MatchRegistry {
    config: EngineConfig,
    matches: RwLock<AHashMap<MatchId, Arc<MatchEntry>>>,
}

impl MatchRegistry {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            matches: RwLock::new(AHashMap::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn entry(&self, id: MatchId) -> Result<Arc<MatchEntry>> {
        let matches = self.matches.read().unwrap_or_else(PoisonError::into_inner);
        matches.get(&id).cloned().ok_or(CarrierError::MatchNotFound(id))
    }

    /// Open a new match and seat its creator on side A
    ///
    /// With a seed the generated map and every combat roll are reproducible.
    pub fn create(&self, name: &str, seed: Option<u64>) -> Result<Seat> {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let board = GameBoard::generate(self.config.clone(), &mut rng)?;

        let id = MatchId::new();
        let mut game = Match::new(id, board, rng);
        let (side, token) = game.seat(name)?;
        let (updates, _) = watch::channel(game.update());
        let entry = Arc::new(MatchEntry {
            state: Mutex::new(game),
            updates,
        });

        self.matches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entry);
        info!(match_id = %id, seed, player = name, "match created");
        Ok(Seat { match_id: id, side, token })
    }

    /// Take the open seat of an existing match
    pub fn join(&self, id: MatchId, name: &str) -> Result<Seat> {
        let entry = self.entry(id)?;
        let mut game = entry.lock();
        if game.status == MatchStatus::Over {
            return Err(CarrierError::MatchOver);
        }
        let (side, token) = game.seat(name)?;
        entry.publish(&game);
        info!(match_id = %id, %side, player = name, "player joined");
        Ok(Seat { match_id: id, side, token })
    }

    /// Give up a seat; the match is dropped once both seats are empty
    pub fn leave(&self, id: MatchId, token: PlayerToken) -> Result<()> {
        let entry = self.entry(id)?;
        let empty = {
            let mut game = entry.lock();
            let side = game.side_for_token(token).ok_or(CarrierError::InvalidToken)?;
            let empty = game.vacate(side);
            entry.publish(&game);
            info!(match_id = %id, %side, "player left");
            empty
        };
        if empty {
            self.remove(id)?;
        }
        Ok(())
    }

    /// Store one side's orders, resolving the turn when both are in
    pub fn submit_orders(
        &self,
        id: MatchId,
        token: PlayerToken,
        orders: PlayerOrders,
    ) -> Result<SubmitReceipt> {
        let entry = self.entry(id)?;
        let mut game = entry.lock();
        let side = game.side_for_token(token).ok_or(CarrierError::InvalidToken)?;
        let outcome = game.submit(side, orders)?;
        if let Some(outcome) = &outcome {
            info!(match_id = %id, turn = outcome.turn, over = outcome.status.over, "turn resolved");
            entry.publish(&game);
        }
        Ok(SubmitReceipt {
            status: game.status,
            turn: game.board.turn,
            outcome,
        })
    }

    /// Check orders without storing them
    pub fn validate_orders(
        &self,
        id: MatchId,
        side: Side,
        orders: &PlayerOrders,
    ) -> Result<Vec<OrderRejection>> {
        let entry = self.entry(id)?;
        let game = entry.lock();
        Ok(game.board.validate_orders(side, orders))
    }

    /// Snapshot for a player, or for a spectator when `token` is `None`
    pub fn view(&self, id: MatchId, token: Option<PlayerToken>) -> Result<MatchSnapshot> {
        let entry = self.entry(id)?;
        let game = entry.lock();
        let side = match token {
            Some(token) => Some(game.side_for_token(token).ok_or(CarrierError::InvalidToken)?),
            None => None,
        };
        Ok(game.snapshot(side))
    }

    /// Watch a match for status and turn changes
    pub fn subscribe(&self, id: MatchId) -> Result<watch::Receiver<MatchUpdate>> {
        Ok(self.entry(id)?.updates.subscribe())
    }

    pub fn list(&self) -> Vec<MatchSummary> {
        let entries: Vec<Arc<MatchEntry>> = self
            .matches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut summaries: Vec<MatchSummary> = entries
            .iter()
            .map(|entry| {
                let game = entry.lock();
                MatchSummary {
                    match_id: game.id,
                    status: game.status,
                    turn: game.board.turn,
                    players: game.slots.iter().filter_map(|s| s.name.clone()).collect(),
                }
            })
            .collect();
        summaries.sort_by_key(|s| s.match_id.0);
        summaries
    }

    pub fn remove(&self, id: MatchId) -> Result<()> {
        let removed = self
            .matches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match removed {
            Some(_) => {
                info!(match_id = %id, "match removed");
                Ok(())
            }
            None => {
                warn!(match_id = %id, "remove of unknown match");
                Err(CarrierError::MatchNotFound(id))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.matches.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
