//! Reordering engine — computes next round's ladder from this round's results.
//!
//! The pipeline runs six passes in a fixed order; each pass takes the previous
//! pass's output by value or reference and returns a new value:
//!
//! 1. **Split** the ladder into active and passive placements (ladder order).
//! 2. **Absence penalty**: passive pairs sink, bottom-up, each claiming the
//!    slot it lands on so later movers cannot collide with it.
//! 3. **Swap between pods**: last of each pod trades places with first of the
//!    next pod; the pods' rankings are concatenated.
//! 4. **Reassign active positions**: active pairs fill, in swapped order, the
//!    positions passive pairs did not claim.
//! 5. **Combine**: merge, clear the playing flag, sort by position.
//! 6. **Late/miss penalty**: LATE then MISSING pairs move down on the merged
//!    ladder, capped at the bottom.
//!
//! The input ladder is never mutated. Every reference is validated before the
//! first pass, so a failed reorder commits nothing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Pair, PairId, Penalty, PenaltyMap, PenaltyTable, PodId};
use crate::ladder::{Ladder, LadderError};
use crate::scorecard::Pod;

/// Errors from a reordering pass. Any error aborts the whole pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("{0} is not on the ladder")]
    PairNotFound(PairId),

    #[error("{0} still has unentered results")]
    UnresolvedPod(PodId),

    #[error("{pair} is in {pod} but is not playing this round")]
    InactiveInPod { pod: PodId, pair: PairId },

    #[error("{0} appears in more than one pod")]
    DuplicateInPods(PairId),

    #[error("{0} is playing but belongs to no pod")]
    ActiveWithoutPod(PairId),

    #[error(transparent)]
    Ladder(#[from] LadderError),
}

/// A pair id pinned to a 1-based position during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: PairId,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderOutcome {
    /// Next round's ladder.
    pub ladder: Ladder,
    /// Active pairs after the pod swap, best first.
    pub swapped_order: Vec<PairId>,
}

/// Seam for alternative promotion/relegation rules.
pub trait LadderReorderer: Send + Sync {
    fn reorder(
        &self,
        ladder: &Ladder,
        pods: &[Pod],
        penalties: &PenaltyMap,
    ) -> Result<ReorderOutcome, ReorderError>;
}

/// The standard rule set: one boundary swap between adjacent pods plus the
/// attendance penalties from a [`PenaltyTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PodSwapReorderer {
    pub rules: PenaltyTable,
}

impl PodSwapReorderer {
    pub fn new(rules: PenaltyTable) -> Self {
        Self { rules }
    }
}

impl LadderReorderer for PodSwapReorderer {
    fn reorder(
        &self,
        ladder: &Ladder,
        pods: &[Pod],
        penalties: &PenaltyMap,
    ) -> Result<ReorderOutcome, ReorderError> {
        reorder(ladder, pods, penalties, &self.rules)
    }
}

/// Run the full pipeline.
///
/// `penalties` overrides the penalty carried on each pair; an explicit
/// `Penalty::Zero` entry clears it. In the returned ladder every pair has
/// `last_week_position` set to its incoming position, a zero penalty, a zero
/// score and the playing flag cleared.
pub fn reorder(
    ladder: &Ladder,
    pods: &[Pod],
    penalties: &PenaltyMap,
    rules: &PenaltyTable,
) -> Result<ReorderOutcome, ReorderError> {
    validate(ladder, pods, penalties)?;
    let len = ladder.len();

    let mut pending: PenaltyMap = ladder
        .pairs()
        .iter()
        .map(|p| (p.id, p.penalty))
        .collect();
    pending.extend(penalties.iter().map(|(&id, &penalty)| (id, penalty)));
    pending.retain(|_, penalty| !penalty.is_zero());

    let arena: BTreeMap<PairId, Pair> = ladder
        .iter_positions()
        .map(|(position, pair)| {
            let mut pair = pair.clone();
            pair.last_week_position = Some(position);
            pair.penalty = Penalty::Zero;
            pair.score = 0;
            (pair.id, pair)
        })
        .collect();

    let (active, passive) = split(ladder);
    debug!(
        active = active.len(),
        passive = passive.len(),
        penalties = pending.len(),
        "split ladder"
    );

    let (passive, pending) = apply_absence_penalty(&passive, pending, len, rules);
    debug!(passive = passive.len(), "applied absence penalty");

    let swapped_order = swap_between_pods(pods);
    debug!(pods = pods.len(), "swapped pod boundaries");

    let active = assign_active_positions(&swapped_order, &passive, len);
    let combined = combine(arena, passive.iter().chain(active.iter()).copied());

    let ladder = apply_late_miss_penalty(combined, &pending, rules)?;
    debug!(pairs = ladder.len(), "reorder complete");

    Ok(ReorderOutcome {
        ladder,
        swapped_order,
    })
}

/// Pass 1: `(active, passive)` placements, each in ladder order.
pub fn split(ladder: &Ladder) -> (Vec<Placement>, Vec<Placement>) {
    ladder
        .iter_positions()
        .map(|(position, pair)| {
            (
                pair.active,
                Placement {
                    id: pair.id,
                    position,
                },
            )
        })
        .fold((Vec::new(), Vec::new()), |(mut active, mut passive), (is_active, placement)| {
            if is_active {
                active.push(placement);
            } else {
                passive.push(placement);
            }
            (active, passive)
        })
}

/// Pass 2: sink passive pairs.
///
/// Walks from the worst passive pair to the best. `lowest_free` is the lowest
/// slot not yet claimed by a pair already walked, starting at the bottom of
/// the ladder. A pair may drop by at most the ABSENT shift and never past
/// `lowest_free`; then it claims its slot. ACCIDENT pairs keep their position
/// but still claim it.
///
/// Returns the new passive placements (ladder order) and the penalties left
/// for later passes, i.e. `penalties` without any passive pair.
pub fn apply_absence_penalty(
    passive: &[Placement],
    mut penalties: PenaltyMap,
    ladder_len: usize,
    rules: &PenaltyTable,
) -> (Vec<Placement>, PenaltyMap) {
    let absent_shift = rules.shift(Penalty::Absent);
    let mut lowest_free = ladder_len;
    let mut moved = passive.to_vec();

    for placement in moved.iter_mut().rev() {
        let penalty = penalties.remove(&placement.id).unwrap_or_default();
        if penalty != Penalty::Accident {
            let room = lowest_free.saturating_sub(placement.position);
            placement.position += room.min(absent_shift);
        }
        lowest_free = placement.position - 1;
    }

    (moved, penalties)
}

/// Pass 3: swap the last-ranked member of each pod with the first-ranked
/// member of the next pod, then concatenate the rankings in pod order.
pub fn swap_between_pods(pods: &[Pod]) -> Vec<PairId> {
    let mut groups: Vec<Vec<PairId>> = pods.iter().map(Pod::rankings).collect();
    for i in 1..groups.len() {
        let (upper, lower) = groups.split_at_mut(i);
        let above = &mut upper[i - 1];
        let below = &mut lower[0];
        if let (Some(last), Some(first)) = (above.last_mut(), below.first_mut()) {
            std::mem::swap(last, first);
        }
    }
    groups.into_iter().flatten().collect()
}

/// Pass 4: give each active pair, in `order`, the next position that no
/// passive pair holds.
///
/// # Panics
/// If the active and passive counts do not add up to `ladder_len`.
pub fn assign_active_positions(
    order: &[PairId],
    passive: &[Placement],
    ladder_len: usize,
) -> Vec<Placement> {
    assert_eq!(
        order.len() + passive.len(),
        ladder_len,
        "active and passive pairs must account for the whole ladder"
    );
    let taken: BTreeSet<usize> = passive.iter().map(|p| p.position).collect();
    (1..=ladder_len)
        .filter(|position| !taken.contains(position))
        .zip(order)
        .map(|(position, &id)| Placement { id, position })
        .collect()
}

/// Pass 5: merge placements into a ladder, ending the round for every pair.
///
/// # Panics
/// If a placement names a pair not in `arena`, a pair is left unplaced, or the
/// positions are not a dense `1..=N` range.
pub fn combine(
    mut arena: BTreeMap<PairId, Pair>,
    placements: impl IntoIterator<Item = Placement>,
) -> Ladder {
    let placed: Vec<(usize, Pair)> = placements
        .into_iter()
        .map(|placement| {
            let mut pair = arena
                .remove(&placement.id)
                .unwrap_or_else(|| panic!("{} placed but not on the ladder", placement.id));
            pair.active = false;
            (placement.position, pair)
        })
        .collect();
    assert!(
        arena.is_empty(),
        "pairs left without a position: {:?}",
        arena.keys().collect::<Vec<_>>()
    );
    Ladder::from_positions(placed)
}

/// Pass 6: move LATE pairs, then MISSING pairs, down by their shift.
///
/// Within one kind pairs are moved bottom-up so a penalised pair never hands
/// its drop back to another penalised pair right above it.
pub fn apply_late_miss_penalty(
    mut ladder: Ladder,
    penalties: &PenaltyMap,
    rules: &PenaltyTable,
) -> Result<Ladder, LadderError> {
    for kind in [Penalty::Late, Penalty::Missing] {
        let shift = rules.shift(kind);
        let targets: Vec<PairId> = ladder
            .pairs()
            .iter()
            .filter(|pair| penalties.get(&pair.id) == Some(&kind))
            .map(|pair| pair.id)
            .collect();
        for id in targets.into_iter().rev() {
            let position = ladder.move_down(id, shift)?;
            debug!(pair = %id, penalty = %kind, position, "applied post-merge penalty");
        }
    }
    Ok(ladder)
}

fn validate(ladder: &Ladder, pods: &[Pod], penalties: &PenaltyMap) -> Result<(), ReorderError> {
    let mut in_pods = HashSet::new();
    for pod in pods {
        for &id in pod.members() {
            let pair = ladder.find(id).ok_or(ReorderError::PairNotFound(id))?;
            if !pair.active {
                return Err(ReorderError::InactiveInPod {
                    pod: pod.id(),
                    pair: id,
                });
            }
            if !in_pods.insert(id) {
                return Err(ReorderError::DuplicateInPods(id));
            }
        }
        if !pod.is_resolved() {
            return Err(ReorderError::UnresolvedPod(pod.id()));
        }
    }
    if let Some(pair) = ladder
        .pairs()
        .iter()
        .find(|pair| pair.active && !in_pods.contains(&pair.id))
    {
        return Err(ReorderError::ActiveWithoutPod(pair.id));
    }
    if let Some(&id) = penalties.keys().find(|&&id| !ladder.contains(id)) {
        return Err(ReorderError::PairNotFound(id));
    }
    Ok(())
}
