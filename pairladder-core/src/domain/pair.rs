use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{PairId, PlayerId};
use super::penalty::Penalty;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
}

impl Player {
    pub fn new(id: u32, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: PlayerId(id),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Categorical play-time label. Orthogonal to ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    #[default]
    Unassigned,
    First,
    Second,
}

impl TimeSlot {
    /// Slots a pod can actually be scheduled into.
    pub const PLAYABLE: [TimeSlot; 2] = [TimeSlot::First, TimeSlot::Second];
}

/// A two-player team, the atomic ranked unit.
///
/// The pair carries no position of its own: its position is its index in the
/// owning [`Ladder`](crate::ladder::Ladder) plus one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: PairId,
    pub players: [Player; 2],
    /// Position before the most recent reordering pass. Audit only.
    pub last_week_position: Option<usize>,
    /// Playing in the current round.
    pub active: bool,
    pub penalty: Penalty,
    pub score: i32,
    pub time_slot: TimeSlot,
}

impl Pair {
    pub fn new(id: u32, first: Player, second: Player) -> Self {
        Self {
            id: PairId(id),
            players: [first, second],
            last_week_position: None,
            active: false,
            penalty: Penalty::Zero,
            score: 0,
            time_slot: TimeSlot::Unassigned,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player)
    }

    /// True if the two pairs have at least one player in common.
    pub fn shares_player_with(&self, other: &Pair) -> bool {
        self.players.iter().any(|p| other.has_player(p.id))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} & {})", self.id, self.players[0], self.players[1])
    }
}
