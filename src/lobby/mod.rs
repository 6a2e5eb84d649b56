//! Match lobby - seats, order barrier and change notifications

pub mod match_state;
pub mod registry;

pub use match_state::{Match, MatchSnapshot, MatchStatus, MatchUpdate, PlayerSlot, WaitingFor};
pub use registry::{MatchRegistry, MatchSummary, Seat, SubmitReceipt};
