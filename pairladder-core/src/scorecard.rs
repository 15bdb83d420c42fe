//! Pods (scorecards) — a small round-robin group of active pairs.
//!
//! Membership is fixed when the pod is created. Results are a grid with one
//! row per match and one column per member; a resolved row has exactly one
//! `Win` and one `Lose`. No two rows may pit the same two members against each
//! other, so a resolved pod is a full single round robin. Scores are +1 per win
//! and −1 per loss, and the pod's ranking is its members sorted by score with
//! ties kept in ladder order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{PairId, PodId, TimeSlot};

/// Why a result grid was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridFault {
    #[error("expected {expected} match rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: expected one win and one loss, found {wins} wins and {losses} losses")]
    RowOutcome {
        row: usize,
        wins: usize,
        losses: usize,
    },

    #[error("row {row}: the same two pairs already played in row {earlier}")]
    RepeatedPairing { row: usize, earlier: usize },
}

/// Errors from result entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScorecardError {
    #[error("unknown result marker '{0}' (expected W, L or blank)")]
    UnknownMarker(String),

    #[error("malformed result grid: {0}")]
    MalformedResultGrid(GridFault),

    #[error("{pair} is not a member of {pod}")]
    NotAMember { pod: PodId, pair: PairId },

    #[error("match {index} is out of range for {pod} ({matches} matches)")]
    MatchOutOfRange {
        pod: PodId,
        index: usize,
        matches: usize,
    },

    #[error("{0} cannot play against itself")]
    SelfMatch(PairId),

    #[error("{first} and {second} already played in match {index} of {pod}")]
    PairingAlreadyPlayed {
        pod: PodId,
        first: PairId,
        second: PairId,
        index: usize,
    },
}

/// One cell of the result grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
    #[default]
    Neutral,
}

impl FromStr for Outcome {
    type Err = ScorecardError;

    /// Accepts the raw markers the result-entry UI sends: `W`, `L`, blank or `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "W" | "w" => Ok(Outcome::Win),
            "L" | "l" => Ok(Outcome::Lose),
            "" | "-" => Ok(Outcome::Neutral),
            other => Err(ScorecardError::UnknownMarker(other.to_string())),
        }
    }
}

/// Rectangular match × member grid of outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultGrid {
    rows: Vec<Vec<Outcome>>,
}

impl ResultGrid {
    pub fn new(rows: Vec<Vec<Outcome>>) -> Self {
        Self { rows }
    }

    /// Parse rows of raw string markers.
    pub fn parse<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, ScorecardError> {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_ref().parse()).collect())
            .collect::<Result<Vec<Vec<Outcome>>, _>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<Outcome>] {
        &self.rows
    }
}

/// Where a pod stands after a result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodStatus {
    Resolved,
    Pending { matches_left: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    id: PodId,
    members: Vec<PairId>,
    results: Vec<Vec<Outcome>>,
    pub time_slot: TimeSlot,
}

impl Pod {
    /// `members` in ladder order.
    pub fn new(id: PodId, members: Vec<PairId>) -> Self {
        let matches = round_robin_matches(members.len());
        let results = vec![vec![Outcome::Neutral; members.len()]; matches];
        Self {
            id,
            members,
            results,
            time_slot: TimeSlot::Unassigned,
        }
    }

    pub fn id(&self) -> PodId {
        self.id
    }

    pub fn members(&self) -> &[PairId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, pair: PairId) -> bool {
        self.members.contains(&pair)
    }

    /// Matches in a single round robin over the members.
    pub fn match_count(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[Vec<Outcome>] {
        &self.results
    }

    /// Replace every result with `grid`. On error the pod is left untouched.
    pub fn record_results(&mut self, grid: &ResultGrid) -> Result<PodStatus, ScorecardError> {
        let rows = grid.rows();
        if rows.len() != self.match_count() {
            return Err(ScorecardError::MalformedResultGrid(GridFault::RowCount {
                expected: self.match_count(),
                found: rows.len(),
            }));
        }
        let mut played: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != self.members.len() {
                return Err(ScorecardError::MalformedResultGrid(GridFault::ColumnCount {
                    row,
                    expected: self.members.len(),
                    found: cells.len(),
                }));
            }
            let (wins, losses) = tally(cells);
            if wins != 1 || losses != 1 {
                return Err(ScorecardError::MalformedResultGrid(GridFault::RowOutcome {
                    row,
                    wins,
                    losses,
                }));
            }
            if let Some(opponents) = pairing(cells) {
                if let Some(&earlier) = played.get(&opponents) {
                    return Err(ScorecardError::MalformedResultGrid(
                        GridFault::RepeatedPairing { row, earlier },
                    ));
                }
                played.insert(opponents, row);
            }
        }
        self.results = rows.to_vec();
        Ok(self.status())
    }

    /// Record a single match: `winner` beat `loser`.
    pub fn record_match(
        &mut self,
        index: usize,
        winner: PairId,
        loser: PairId,
    ) -> Result<PodStatus, ScorecardError> {
        if index >= self.match_count() {
            return Err(ScorecardError::MatchOutOfRange {
                pod: self.id,
                index,
                matches: self.match_count(),
            });
        }
        if winner == loser {
            return Err(ScorecardError::SelfMatch(winner));
        }
        let winner_col = self.column_of(winner)?;
        let loser_col = self.column_of(loser)?;

        let opponents = (winner_col.min(loser_col), winner_col.max(loser_col));
        let earlier = (0..self.results.len())
            .find(|&i| i != index && pairing(&self.results[i]) == Some(opponents));
        if let Some(earlier) = earlier {
            return Err(ScorecardError::PairingAlreadyPlayed {
                pod: self.id,
                first: self.members[opponents.0],
                second: self.members[opponents.1],
                index: earlier,
            });
        }

        let row = &mut self.results[index];
        row.iter_mut().for_each(|cell| *cell = Outcome::Neutral);
        row[winner_col] = Outcome::Win;
        row[loser_col] = Outcome::Lose;
        Ok(self.status())
    }

    pub fn is_resolved(&self) -> bool {
        self.pending_matches() == 0
    }

    pub fn status(&self) -> PodStatus {
        match self.pending_matches() {
            0 => PodStatus::Resolved,
            matches_left => PodStatus::Pending { matches_left },
        }
    }

    /// Per-member score in member order.
    pub fn scores(&self) -> Vec<(PairId, i32)> {
        self.members
            .iter()
            .enumerate()
            .map(|(col, &id)| {
                let score = self
                    .results
                    .iter()
                    .map(|row| match row[col] {
                        Outcome::Win => 1,
                        Outcome::Lose => -1,
                        Outcome::Neutral => 0,
                    })
                    .sum();
                (id, score)
            })
            .collect()
    }

    pub fn score_of(&self, pair: PairId) -> Option<i32> {
        self.scores()
            .into_iter()
            .find(|(id, _)| *id == pair)
            .map(|(_, score)| score)
    }

    /// Members best first. Equal scores keep their ladder order.
    pub fn rankings(&self) -> Vec<PairId> {
        let mut scored = self.scores();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(id, _)| id).collect()
    }

    fn pending_matches(&self) -> usize {
        self.results
            .iter()
            .filter(|row| tally(row) != (1, 1))
            .count()
    }

    fn column_of(&self, pair: PairId) -> Result<usize, ScorecardError> {
        self.members
            .iter()
            .position(|&m| m == pair)
            .ok_or(ScorecardError::NotAMember { pod: self.id, pair })
    }
}

fn round_robin_matches(members: usize) -> usize {
    members * members.saturating_sub(1) / 2
}

/// Columns of the two members a resolved row pits against each other,
/// lowest first.
fn pairing(cells: &[Outcome]) -> Option<(usize, usize)> {
    if tally(cells) != (1, 1) {
        return None;
    }
    let mut playing = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| **cell != Outcome::Neutral)
        .map(|(col, _)| col);
    Some((playing.next()?, playing.next()?))
}

fn tally(cells: &[Outcome]) -> (usize, usize) {
    cells.iter().fold((0, 0), |(w, l), cell| match cell {
        Outcome::Win => (w + 1, l),
        Outcome::Lose => (w, l + 1),
        Outcome::Neutral => (w, l),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod3() -> Pod {
        Pod::new(PodId(0), vec![PairId(1), PairId(2), PairId(3)])
    }

    #[test]
    fn match_counts() {
        assert_eq!(pod3().match_count(), 3);
        let quad = Pod::new(PodId(1), (1..=4).map(PairId).collect());
        assert_eq!(quad.match_count(), 6);
        let five = Pod::new(PodId(2), (1..=5).map(PairId).collect());
        assert_eq!(five.match_count(), 10);
    }

    #[test]
    fn parse_markers() {
        assert_eq!("W".parse::<Outcome>().unwrap(), Outcome::Win);
        assert_eq!(" l ".parse::<Outcome>().unwrap(), Outcome::Lose);
        assert_eq!("".parse::<Outcome>().unwrap(), Outcome::Neutral);
        assert_eq!("-".parse::<Outcome>().unwrap(), Outcome::Neutral);
        assert_eq!(
            "X".parse::<Outcome>().unwrap_err(),
            ScorecardError::UnknownMarker("X".into())
        );
    }

    #[test]
    fn full_grid_resolves_and_ranks() {
        let mut pod = pod3();
        // 3 beats 1, 2 beats 1, 3 beats 2
        let grid = ResultGrid::parse(&[
            vec!["L", "", "W"],
            vec!["L", "W", ""],
            vec!["", "L", "W"],
        ])
        .unwrap();
        assert_eq!(pod.record_results(&grid).unwrap(), PodStatus::Resolved);
        assert!(pod.is_resolved());
        assert_eq!(pod.score_of(PairId(3)), Some(2));
        assert_eq!(pod.score_of(PairId(2)), Some(0));
        assert_eq!(pod.score_of(PairId(1)), Some(-2));
        assert_eq!(pod.rankings(), vec![PairId(3), PairId(2), PairId(1)]);
    }

    #[test]
    fn ties_keep_ladder_order() {
        let mut pod = pod3();
        // Circular: 1 > 2, 2 > 3, 3 > 1
        pod.record_match(0, PairId(1), PairId(2)).unwrap();
        pod.record_match(1, PairId(2), PairId(3)).unwrap();
        pod.record_match(2, PairId(3), PairId(1)).unwrap();
        assert!(pod.is_resolved());
        assert_eq!(pod.rankings(), vec![PairId(1), PairId(2), PairId(3)]);
    }

    #[test]
    fn unresolved_pod_reports_pending() {
        let mut pod = pod3();
        assert_eq!(pod.status(), PodStatus::Pending { matches_left: 3 });
        let status = pod.record_match(1, PairId(2), PairId(1)).unwrap();
        assert_eq!(status, PodStatus::Pending { matches_left: 2 });
        assert_eq!(pod.rankings(), vec![PairId(2), PairId(3), PairId(1)]);
    }

    #[test]
    fn wrong_row_count_is_malformed() {
        let mut pod = pod3();
        let grid = ResultGrid::parse(&[vec!["W", "L", ""]]).unwrap();
        let err = pod.record_results(&grid).unwrap_err();
        assert_eq!(
            err,
            ScorecardError::MalformedResultGrid(GridFault::RowCount {
                expected: 3,
                found: 1
            })
        );
        assert_eq!(pod.status(), PodStatus::Pending { matches_left: 3 });
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let mut pod = pod3();
        let grid = ResultGrid::parse(&[
            vec!["W", "L", ""],
            vec!["W", "L"],
            vec!["", "W", "L"],
        ])
        .unwrap();
        assert!(matches!(
            pod.record_results(&grid),
            Err(ScorecardError::MalformedResultGrid(GridFault::ColumnCount { row: 1, .. }))
        ));
    }

    #[test]
    fn row_without_single_winner_is_malformed_and_nothing_changes() {
        let mut pod = pod3();
        pod.record_match(0, PairId(1), PairId(2)).unwrap();
        let before = pod.clone();
        let grid = ResultGrid::parse(&[
            vec!["W", "L", ""],
            vec!["W", "W", "L"],
            vec!["", "W", "L"],
        ])
        .unwrap();
        assert_eq!(
            pod.record_results(&grid).unwrap_err(),
            ScorecardError::MalformedResultGrid(GridFault::RowOutcome {
                row: 1,
                wins: 2,
                losses: 1
            })
        );
        assert_eq!(pod, before);
    }

    #[test]
    fn re_entering_results_replaces_them() {
        let mut pod = pod3();
        let first = ResultGrid::parse(&[
            vec!["W", "L", ""],
            vec!["W", "", "L"],
            vec!["", "W", "L"],
        ])
        .unwrap();
        let second = ResultGrid::parse(&[
            vec!["L", "W", ""],
            vec!["L", "", "W"],
            vec!["", "L", "W"],
        ])
        .unwrap();
        pod.record_results(&first).unwrap();
        pod.record_results(&second).unwrap();
        assert_eq!(pod.rankings(), vec![PairId(3), PairId(2), PairId(1)]);
        assert_eq!(pod.score_of(PairId(3)), Some(2));
    }

    #[test]
    fn record_match_validation() {
        let mut pod = pod3();
        assert_eq!(
            pod.record_match(3, PairId(1), PairId(2)).unwrap_err(),
            ScorecardError::MatchOutOfRange {
                pod: PodId(0),
                index: 3,
                matches: 3
            }
        );
        assert_eq!(
            pod.record_match(0, PairId(1), PairId(9)).unwrap_err(),
            ScorecardError::NotAMember {
                pod: PodId(0),
                pair: PairId(9)
            }
        );
        assert_eq!(
            pod.record_match(0, PairId(1), PairId(1)).unwrap_err(),
            ScorecardError::SelfMatch(PairId(1))
        );
    }

    #[test]
    fn grid_repeating_a_pairing_is_malformed() {
        let mut pod = pod3();
        // 1 beats 2 three times; 3 never plays.
        let grid = ResultGrid::parse(&[
            vec!["W", "L", ""],
            vec!["W", "L", ""],
            vec!["L", "W", ""],
        ])
        .unwrap();
        assert_eq!(
            pod.record_results(&grid).unwrap_err(),
            ScorecardError::MalformedResultGrid(GridFault::RepeatedPairing {
                row: 1,
                earlier: 0
            })
        );
        assert_eq!(pod.status(), PodStatus::Pending { matches_left: 3 });
    }

    #[test]
    fn record_match_rejects_a_second_meeting() {
        let mut pod = pod3();
        pod.record_match(0, PairId(1), PairId(2)).unwrap();
        assert_eq!(
            pod.record_match(1, PairId(2), PairId(1)).unwrap_err(),
            ScorecardError::PairingAlreadyPlayed {
                pod: PodId(0),
                first: PairId(1),
                second: PairId(2),
                index: 0
            }
        );
        // Correcting the same match is fine.
        pod.record_match(0, PairId(2), PairId(1)).unwrap();
        pod.record_match(1, PairId(1), PairId(3)).unwrap();
        let status = pod.record_match(2, PairId(3), PairId(2)).unwrap();
        assert_eq!(status, PodStatus::Resolved);
    }

    #[test]
    fn record_match_overwrites_row() {
        let mut pod = pod3();
        pod.record_match(0, PairId(1), PairId(2)).unwrap();
        pod.record_match(0, PairId(3), PairId(1)).unwrap();
        assert_eq!(
            pod.results()[0],
            vec![Outcome::Lose, Outcome::Neutral, Outcome::Win]
        );
    }
}
