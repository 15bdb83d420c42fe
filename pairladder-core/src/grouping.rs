//! Pod grouper — partitions the active pairs into round-robin pods.
//!
//! Pods are cut from the active pairs in ladder order. Triples are preferred;
//! the remainder is folded into the last pod(s) as groups of four so no pod is
//! left with two teams:
//!
//! ```text
//! P % 3 == 0  →  3, 3, …, 3
//! P % 3 == 1  →  3, …, 3, 4
//! P % 3 == 2  →  3, …, 3, 4, 4
//! ```
//!
//! Five active pairs cannot be split into threes and fours, so they play as a
//! single pod of five. One or two active pairs cannot form a ranking at all and
//! are rejected.

use thiserror::Error;

use crate::domain::{PairId, PodId};
use crate::scorecard::Pod;

/// Smallest pod that produces a meaningful internal ranking.
pub const MIN_POD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupingError {
    #[error("{count} active pairs cannot form a pod (need at least 3)")]
    TooFewActive { count: usize },
}

/// Pod sizes, in pod order, for `active` playing pairs.
pub fn pod_sizes(active: usize) -> Result<Vec<usize>, GroupingError> {
    let sizes = match active {
        0 => Vec::new(),
        1 | 2 => return Err(GroupingError::TooFewActive { count: active }),
        5 => vec![5],
        n => {
            let (triples, quads) = match n % 3 {
                0 => (n / 3, 0),
                1 => (n / 3 - 1, 1),
                _ => (n / 3 - 2, 2),
            };
            let mut sizes = vec![3; triples];
            sizes.extend(std::iter::repeat(4).take(quads));
            sizes
        }
    };
    Ok(sizes)
}

/// Split the active pairs (in ladder order) into fresh, unresolved pods.
pub fn group_pods(active: &[PairId]) -> Result<Vec<Pod>, GroupingError> {
    let sizes = pod_sizes(active.len())?;
    let mut pods = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for (index, size) in sizes.into_iter().enumerate() {
        let members = active[start..start + size].to_vec();
        pods.push(Pod::new(PodId(index), members));
        start += size;
    }
    debug_assert_eq!(start, active.len());
    Ok(pods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<PairId> {
        (1..=n).map(PairId).collect()
    }

    fn sizes_of(pods: &[Pod]) -> Vec<usize> {
        pods.iter().map(Pod::len).collect()
    }

    #[test]
    fn nine_active_make_three_triples() {
        let pods = group_pods(&ids(9)).unwrap();
        assert_eq!(sizes_of(&pods), vec![3, 3, 3]);
        assert_eq!(pods[1].members(), &[PairId(4), PairId(5), PairId(6)]);
    }

    #[test]
    fn ten_active_end_with_a_quad() {
        let pods = group_pods(&ids(10)).unwrap();
        assert_eq!(sizes_of(&pods), vec![3, 3, 4]);
        assert_eq!(
            pods[2].members(),
            &[PairId(7), PairId(8), PairId(9), PairId(10)]
        );
    }

    #[test]
    fn remainder_two_ends_with_two_quads() {
        assert_eq!(pod_sizes(8).unwrap(), vec![4, 4]);
        assert_eq!(pod_sizes(11).unwrap(), vec![3, 4, 4]);
        assert_eq!(pod_sizes(14).unwrap(), vec![3, 3, 4, 4]);
    }

    #[test]
    fn small_counts() {
        assert_eq!(pod_sizes(0).unwrap(), Vec::<usize>::new());
        assert_eq!(pod_sizes(3).unwrap(), vec![3]);
        assert_eq!(pod_sizes(4).unwrap(), vec![4]);
        assert_eq!(pod_sizes(5).unwrap(), vec![5]);
        assert_eq!(pod_sizes(6).unwrap(), vec![3, 3]);
        assert_eq!(pod_sizes(7).unwrap(), vec![3, 4]);
    }

    #[test]
    fn one_or_two_active_are_rejected() {
        assert_eq!(
            group_pods(&ids(2)).unwrap_err(),
            GroupingError::TooFewActive { count: 2 }
        );
        assert_eq!(
            group_pods(&ids(1)).unwrap_err(),
            GroupingError::TooFewActive { count: 1 }
        );
    }

    #[test]
    fn pods_preserve_ladder_order_and_ids() {
        let active = vec![PairId(8), PairId(3), PairId(5), PairId(1), PairId(9), PairId(2)];
        let pods = group_pods(&active).unwrap();
        assert_eq!(pods[0].id(), PodId(0));
        assert_eq!(pods[1].id(), PodId(1));
        let flat: Vec<PairId> = pods.iter().flat_map(|p| p.members().to_vec()).collect();
        assert_eq!(flat, active);
    }
}
