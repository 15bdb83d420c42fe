//! Domain types for PairLadder

pub mod ids;
pub mod pair;
pub mod penalty;

pub use ids::{PairId, PlayerId, PodId};
pub use pair::{Pair, Player, TimeSlot};
pub use penalty::{Penalty, PenaltyMap, PenaltyTable};
