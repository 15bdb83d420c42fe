//! The ladder — an ordered sequence of pairs with 1-based contiguous positions.
//!
//! Positions are never stored on a pair. The pair at index `i` holds position
//! `i + 1`, so every successful operation keeps positions a dense range
//! `[1, N]` and leaves the relative order of untouched pairs unchanged.
//! All position changes go through this type.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::{Pair, PairId};

/// Errors from ladder operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LadderError {
    #[error("{0} is not on the ladder")]
    PairNotFound(PairId),

    #[error("index {index} is out of bounds for a ladder of {len} pairs")]
    InvalidIndex { index: usize, len: usize },

    #[error("{0} is already on the ladder")]
    DuplicatePair(PairId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    pairs: Vec<Pair>,
}

impl Ladder {
    /// Build a ladder from pairs in rank order (first = position 1).
    pub fn new(pairs: Vec<Pair>) -> Result<Self, LadderError> {
        let mut seen = HashSet::with_capacity(pairs.len());
        for pair in &pairs {
            if !seen.insert(pair.id) {
                return Err(LadderError::DuplicatePair(pair.id));
            }
        }
        Ok(Self { pairs })
    }

    /// Build a ladder from explicit `(position, pair)` placements.
    ///
    /// # Panics
    /// If the positions are not exactly `1..=N` or a pair id repeats. Callers
    /// compute placements themselves, so either case is a broken invariant.
    pub fn from_positions(mut placed: Vec<(usize, Pair)>) -> Self {
        placed.sort_by_key(|(position, _)| *position);
        let mut seen = HashSet::with_capacity(placed.len());
        for (index, (position, pair)) in placed.iter().enumerate() {
            assert_eq!(
                *position,
                index + 1,
                "placements must cover positions 1..={} exactly (found {} at slot {})",
                placed.len(),
                position,
                index + 1
            );
            assert!(seen.insert(pair.id), "{} placed twice", pair.id);
        }
        Self {
            pairs: placed.into_iter().map(|(_, pair)| pair).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Read-only view of the pairs in position order.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn get(&self, index: usize) -> Option<&Pair> {
        self.pairs.get(index)
    }

    /// `(position, pair)` in ladder order.
    pub fn iter_positions(&self) -> impl Iterator<Item = (usize, &Pair)> {
        self.pairs.iter().enumerate().map(|(i, p)| (i + 1, p))
    }

    pub fn ids(&self) -> Vec<PairId> {
        self.pairs.iter().map(|p| p.id).collect()
    }

    pub fn contains(&self, id: PairId) -> bool {
        self.index_of(id).is_some()
    }

    /// 1-based position of the pair, if present.
    pub fn position_of(&self, id: PairId) -> Option<usize> {
        self.index_of(id).map(|i| i + 1)
    }

    pub fn find(&self, id: PairId) -> Option<&Pair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    /// Mutable access to a pair's state. Position cannot change through this.
    pub fn find_mut(&mut self, id: PairId) -> Option<&mut Pair> {
        self.pairs.iter_mut().find(|p| p.id == id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pair> {
        self.pairs.iter_mut()
    }

    /// Remove a pair; everyone below moves up one. Returns false if absent.
    pub fn remove_pair(&mut self, id: PairId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.pairs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Pair, LadderError> {
        if index >= self.pairs.len() {
            return Err(LadderError::InvalidIndex {
                index,
                len: self.pairs.len(),
            });
        }
        Ok(self.pairs.remove(index))
    }

    /// Insert so the pair lands at position `index + 1`; pairs at or after
    /// `index` move down one.
    pub fn insert_at(&mut self, index: usize, pair: Pair) -> Result<(), LadderError> {
        if index > self.pairs.len() {
            return Err(LadderError::InvalidIndex {
                index,
                len: self.pairs.len(),
            });
        }
        if self.contains(pair.id) {
            return Err(LadderError::DuplicatePair(pair.id));
        }
        self.pairs.insert(index, pair);
        Ok(())
    }

    /// Append at the bottom (position = new length).
    pub fn push(&mut self, pair: Pair) -> Result<(), LadderError> {
        if self.contains(pair.id) {
            return Err(LadderError::DuplicatePair(pair.id));
        }
        self.pairs.push(pair);
        Ok(())
    }

    /// Move a pair `by` positions toward the bottom, capped at the last
    /// position. Pairs in between move up one. Returns the new position.
    pub fn move_down(&mut self, id: PairId, by: usize) -> Result<usize, LadderError> {
        let from = self.index_of(id).ok_or(LadderError::PairNotFound(id))?;
        let to = from.saturating_add(by).min(self.pairs.len() - 1);
        self.pairs[from..=to].rotate_left(1);
        Ok(to + 1)
    }

    fn index_of(&self, id: PairId) -> Option<usize> {
        self.pairs.iter().position(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Player;

    fn pair(id: u32) -> Pair {
        Pair::new(
            id,
            Player::new(id * 2, "P", format!("{}", id * 2)),
            Player::new(id * 2 + 1, "P", format!("{}", id * 2 + 1)),
        )
    }

    fn ladder(n: u32) -> Ladder {
        Ladder::new((1..=n).map(pair).collect()).unwrap()
    }

    fn ids(l: &Ladder) -> Vec<u32> {
        l.pairs().iter().map(|p| p.id.0).collect()
    }

    #[test]
    fn positions_follow_order() {
        let l = ladder(4);
        let positions: Vec<_> = l.iter_positions().map(|(pos, p)| (pos, p.id.0)).collect();
        assert_eq!(positions, vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
        assert_eq!(l.position_of(PairId(3)), Some(3));
        assert_eq!(l.position_of(PairId(9)), None);
    }

    #[test]
    fn new_rejects_duplicates() {
        let err = Ladder::new(vec![pair(1), pair(2), pair(1)]).unwrap_err();
        assert_eq!(err, LadderError::DuplicatePair(PairId(1)));
    }

    #[test]
    fn remove_closes_gap() {
        let mut l = ladder(5);
        assert!(l.remove_pair(PairId(2)));
        assert_eq!(ids(&l), vec![1, 3, 4, 5]);
        assert_eq!(l.position_of(PairId(3)), Some(2));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut l = ladder(3);
        assert!(!l.remove_pair(PairId(42)));
        assert_eq!(ids(&l), vec![1, 2, 3]);
    }

    #[test]
    fn remove_at_bounds() {
        let mut l = ladder(3);
        assert_eq!(
            l.remove_at(3).unwrap_err(),
            LadderError::InvalidIndex { index: 3, len: 3 }
        );
        assert_eq!(l.remove_at(0).unwrap().id, PairId(1));
        assert_eq!(ids(&l), vec![2, 3]);
    }

    #[test]
    fn insert_shifts_rest_down() {
        let mut l = ladder(3);
        l.insert_at(1, pair(9)).unwrap();
        assert_eq!(ids(&l), vec![1, 9, 2, 3]);
        assert_eq!(l.position_of(PairId(9)), Some(2));
        assert_eq!(l.position_of(PairId(3)), Some(4));
    }

    #[test]
    fn insert_at_len_appends() {
        let mut l = ladder(2);
        l.insert_at(2, pair(9)).unwrap();
        assert_eq!(ids(&l), vec![1, 2, 9]);
    }

    #[test]
    fn insert_out_of_bounds_is_rejected() {
        let mut l = ladder(2);
        let err = l.insert_at(3, pair(9)).unwrap_err();
        assert_eq!(err, LadderError::InvalidIndex { index: 3, len: 2 });
        assert_eq!(ids(&l), vec![1, 2]);
    }

    #[test]
    fn insert_duplicate_is_rejected() {
        let mut l = ladder(2);
        assert_eq!(
            l.insert_at(0, pair(2)).unwrap_err(),
            LadderError::DuplicatePair(PairId(2))
        );
        assert_eq!(l.push(pair(1)).unwrap_err(), LadderError::DuplicatePair(PairId(1)));
    }

    #[test]
    fn push_lands_at_bottom() {
        let mut l = ladder(2);
        l.push(pair(7)).unwrap();
        assert_eq!(l.position_of(PairId(7)), Some(3));
    }

    #[test]
    fn move_down_shifts_intervening_up() {
        let mut l = ladder(8);
        let new_pos = l.move_down(PairId(4), 1).unwrap();
        assert_eq!(new_pos, 5);
        assert_eq!(ids(&l), vec![1, 2, 3, 5, 4, 6, 7, 8]);

        let new_pos = l.move_down(PairId(2), 3).unwrap();
        assert_eq!(new_pos, 5);
        assert_eq!(ids(&l), vec![1, 3, 5, 4, 2, 6, 7, 8]);
    }

    #[test]
    fn move_down_caps_at_bottom() {
        let mut l = ladder(4);
        assert_eq!(l.move_down(PairId(3), 5).unwrap(), 4);
        assert_eq!(ids(&l), vec![1, 2, 4, 3]);
        assert_eq!(l.move_down(PairId(3), 2).unwrap(), 4);
        assert_eq!(
            l.move_down(PairId(99), 1).unwrap_err(),
            LadderError::PairNotFound(PairId(99))
        );
    }

    #[test]
    fn from_positions_sorts() {
        let l = Ladder::from_positions(vec![(2, pair(5)), (1, pair(8)), (3, pair(1))]);
        assert_eq!(ids(&l), vec![8, 5, 1]);
    }

    #[test]
    #[should_panic(expected = "placements must cover positions")]
    fn from_positions_rejects_gaps() {
        Ladder::from_positions(vec![(1, pair(1)), (3, pair(2))]);
    }

    #[test]
    #[should_panic(expected = "placements must cover positions")]
    fn from_positions_rejects_collisions() {
        Ladder::from_positions(vec![(1, pair(1)), (1, pair(2))]);
    }
}
