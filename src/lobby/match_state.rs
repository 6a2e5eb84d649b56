//! A single match: two player seats, the order barrier and the board

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::execution::{GameBoard, TurnOutcome, TurnReport};
use crate::battle::orders::PlayerOrders;
use crate::core::error::{CarrierError, Result};
use crate::core::types::{MatchId, MatchResult, PlayerToken, Side, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Waiting, // Seat open
    Active,
    Over,
}

/// Whose orders the match is waiting on, from one viewer's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitingFor {
    You,
    Opponent,
    Nobody,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerSlot {
    pub token: Option<PlayerToken>,
    pub name: Option<String>,
    pub orders: Option<PlayerOrders>,
}

/// Public change notification, published after every state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub turn: Turn,
    pub result: Option<MatchResult>,
}

/// What one viewer may see of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub turn: Turn,
    pub waiting_for: WaitingFor,
    pub side: Option<Side>,
    pub map_width: u32,
    pub map_height: u32,
    pub map: Vec<Vec<u8>>,
    /// The viewer's side report; spectators get none
    pub view: Option<TurnReport>,
    pub result: Option<MatchResult>,
}

#[derive(Debug)]
pub struct Match {
    pub id: MatchId,
    pub status: MatchStatus,
    pub board: GameBoard,
    pub slots: [PlayerSlot; 2],
    rng: ChaCha8Rng,
}

impl Match {
    pub fn new(id: MatchId, board: GameBoard, rng: ChaCha8Rng) -> Self {
        Self {
            id,
            status: MatchStatus::Waiting,
            board,
            slots: [PlayerSlot::default(), PlayerSlot::default()],
            rng,
        }
    }

    pub fn has_open_slot(&self) -> bool {
        self.slots.iter().any(|s| s.token.is_none())
    }

    pub fn side_for_token(&self, token: PlayerToken) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.slots[side.index()].token == Some(token))
    }

    /// Take the first open seat (A before B)
    pub fn seat(&mut self, name: &str) -> Result<(Side, PlayerToken)> {
        let side = Side::BOTH
            .into_iter()
            .find(|side| self.slots[side.index()].token.is_none())
            .ok_or(CarrierError::MatchFull)?;
        let token = PlayerToken::new();
        self.slots[side.index()] = PlayerSlot {
            token: Some(token),
            name: Some(name.to_string()),
            orders: None,
        };
        if !self.has_open_slot() && self.status == MatchStatus::Waiting {
            self.status = MatchStatus::Active;
            info!(match_id = %self.id, "match active");
        }
        Ok((side, token))
    }

    /// Free a seat; returns true when nobody is left
    pub fn vacate(&mut self, side: Side) -> bool {
        self.slots[side.index()] = PlayerSlot::default();
        if self.status == MatchStatus::Active {
            self.status = MatchStatus::Waiting;
        }
        self.slots.iter().all(|s| s.token.is_none())
    }

    pub fn waiting_for(&self, viewer: Option<Side>) -> WaitingFor {
        if self.status != MatchStatus::Active {
            return WaitingFor::Nobody;
        }
        let pending = |side: Side| self.slots[side.index()].orders.is_none();
        match viewer {
            Some(side) if pending(side) => WaitingFor::You,
            _ if Side::BOTH.into_iter().any(pending) => WaitingFor::Opponent,
            _ => WaitingFor::Nobody,
        }
    }

    /// Store a side's orders; resolves the turn once both sides have ordered
    pub fn submit(&mut self, side: Side, orders: PlayerOrders) -> Result<Option<TurnOutcome>> {
        match self.status {
            MatchStatus::Over => return Err(CarrierError::MatchOver),
            MatchStatus::Waiting => return Err(CarrierError::MatchNotActive),
            MatchStatus::Active => {}
        }

        let rejections = self.board.validate_orders(side, &orders);
        if !rejections.is_empty() {
            return Err(CarrierError::OrdersRejected {
                side,
                reasons: rejections.iter().map(|r| r.to_string()).collect(),
            });
        }
        self.slots[side.index()].orders = Some(orders);
        debug!(match_id = %self.id, %side, "orders stored");

        let [Some(a), Some(b)] = [self.slots[0].orders, self.slots[1].orders] else {
            return Ok(None);
        };
        let outcome = self.board.turn_forward(&[a, b], &mut self.rng);
        // The barrier resets even if resolution fails so neither side is stuck
        for slot in &mut self.slots {
            slot.orders = None;
        }
        let outcome = outcome?;
        if outcome.status.over {
            self.status = MatchStatus::Over;
        }
        Ok(Some(outcome))
    }

    pub fn update(&self) -> MatchUpdate {
        MatchUpdate {
            match_id: self.id,
            status: self.status,
            turn: self.board.turn,
            result: self.board.result,
        }
    }

    pub fn snapshot(&self, viewer: Option<Side>) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id,
            status: self.status,
            turn: self.board.turn,
            waiting_for: self.waiting_for(viewer),
            side: viewer,
            map_width: self.board.grid.width,
            map_height: self.board.grid.height,
            map: self.board.grid.to_rows(),
            view: viewer.map(|side| self.board.report(side)),
            result: self.board.result,
        }
    }
}
