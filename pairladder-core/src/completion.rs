//! Completion tracker — fires once when every pod of a grouping is resolved.
//!
//! The tracker counts distinct resolved pods and sends a single
//! [`RoundComplete`] on a channel when the count reaches the pod total.
//! Reporting the same pod twice, or reporting after the signal was sent, is a
//! no-op, so callers may over-report freely.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::domain::PodId;

/// Sent once per grouping when its last pod is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundComplete {
    pub pods: usize,
}

#[derive(Debug)]
pub struct CompletionTracker {
    total: usize,
    resolved: BTreeSet<PodId>,
    fired: bool,
    signal: Sender<RoundComplete>,
}

impl CompletionTracker {
    /// Tracker for `total` pods plus the receiving end of its signal.
    pub fn new(total: usize) -> (Self, Receiver<RoundComplete>) {
        let (signal, receiver) = mpsc::channel();
        let tracker = Self {
            total,
            resolved: BTreeSet::new(),
            fired: false,
            signal,
        };
        (tracker, receiver)
    }

    /// Record that `pod` has all of its results. Returns true only on the call
    /// that completed the round.
    pub fn mark_resolved(&mut self, pod: PodId) -> bool {
        if self.fired || pod.0 >= self.total {
            return false;
        }
        self.resolved.insert(pod);
        if self.resolved.len() < self.total {
            return false;
        }
        self.fired = true;
        // A dropped receiver means nobody is waiting on this round any more.
        let _ = self.signal.send(RoundComplete { pods: self.total });
        true
    }

    /// Forget a pod that lost its results (e.g. re-entry started over).
    pub fn mark_unresolved(&mut self, pod: PodId) {
        if !self.fired {
            self.resolved.remove(&pod);
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.total - self.resolved.len()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
