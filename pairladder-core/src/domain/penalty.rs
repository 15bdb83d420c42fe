//! Attendance and conduct penalties.
//!
//! A penalty is a categorical flag; how far it pushes a pair down the ladder
//! lives in [`PenaltyTable`] so the rules can change without touching the
//! reordering passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::PairId;

/// Penalty flag carried by a pair until the next reordering pass consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    #[default]
    Zero,
    /// Showed up late: shifted after the merge.
    Late,
    /// Missed part of the round: shifted after the merge.
    Missing,
    /// Sat the round out without notice.
    Absent,
    /// Sat the round out for an excused reason. Exempt from the absence shift.
    Accident,
}

impl Penalty {
    pub const ALL: [Penalty; 5] = [
        Penalty::Zero,
        Penalty::Late,
        Penalty::Missing,
        Penalty::Absent,
        Penalty::Accident,
    ];

    pub fn is_zero(self) -> bool {
        self == Penalty::Zero
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Penalty::Zero => "zero",
            Penalty::Late => "late",
            Penalty::Missing => "missing",
            Penalty::Absent => "absent",
            Penalty::Accident => "accident",
        };
        f.write_str(name)
    }
}

/// Penalties assigned for the current round, keyed by pair.
pub type PenaltyMap = BTreeMap<PairId, Penalty>;

/// Shift magnitude per penalty kind, in positions toward the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyTable {
    pub late: usize,
    pub missing: usize,
    pub absent: usize,
    pub accident: usize,
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            late: 1,
            missing: 2,
            absent: 2,
            accident: 0,
        }
    }
}

impl PenaltyTable {
    pub fn shift(&self, penalty: Penalty) -> usize {
        match penalty {
            Penalty::Zero => 0,
            Penalty::Late => self.late,
            Penalty::Missing => self.missing,
            Penalty::Absent => self.absent,
            Penalty::Accident => self.accident,
        }
    }
}
