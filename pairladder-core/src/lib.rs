//! PairLadder Core — ladder, pods, penalties and the round reordering engine.
//!
//! This crate contains the heart of the league ladder:
//! - Domain types (pairs, players, penalties, time slots, ids)
//! - The ladder: ordered pairs with positions derived from order
//! - Pods (scorecards) with result-grid entry and in-pod rankings
//! - The pod grouper (triples, remainder folded into quads)
//! - A fire-once completion tracker for a grouping
//! - The six-pass reordering pipeline producing next round's ladder
//!
//! Nothing here performs I/O.

pub mod completion;
pub mod domain;
pub mod grouping;
pub mod ladder;
pub mod reorder;
pub mod scorecard;

pub use completion::{CompletionTracker, RoundComplete};
pub use domain::{
    Pair, PairId, Penalty, PenaltyMap, PenaltyTable, Player, PlayerId, PodId, TimeSlot,
};
pub use grouping::{group_pods, pod_sizes, GroupingError};
pub use ladder::{Ladder, LadderError};
pub use reorder::{reorder, LadderReorderer, PodSwapReorderer, ReorderError, ReorderOutcome};
pub use scorecard::{Outcome, Pod, PodStatus, ResultGrid, ScorecardError};
