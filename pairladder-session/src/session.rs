//! Game session — one ladder, its current round, and the next ladder.
//!
//! The session owns the current ladder and everything derived from it for the
//! round in progress: the active set, the pods cut from it, the penalty map
//! and the completion tracker. Every change to the active set regroups the
//! pods and reschedules their time slots.
//!
//! Entering the last missing result fires the tracker; the session hears it on
//! the tracker's channel and runs the reorderer on the spot. The reordered
//! ladder sits beside the current one until [`GameSession::advance_round`]
//! promotes it.

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use pairladder_core::{
    group_pods, CompletionTracker, GroupingError, Ladder, LadderError, LadderReorderer, Pair,
    PairId, Penalty, PenaltyMap, Player, Pod, PodId, PodSwapReorderer, ReorderError,
    ResultGrid, RoundComplete, ScorecardError, TimeSlot,
};

use crate::config::LeagueConfig;
use crate::schedule::distribute_pods;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} is not on the ladder")]
    PairNotFound(PairId),

    #[error("{0} is not in the current grouping")]
    UnknownPod(PodId),

    #[error("no reordered ladder to advance to")]
    NothingToAdvance,

    #[error(transparent)]
    Ladder(#[from] LadderError),

    #[error(transparent)]
    Scorecard(#[from] ScorecardError),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error(transparent)]
    Reorder(#[from] ReorderError),
}

/// Where the round stands after a result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Pending { pods_remaining: usize },
    /// Every pod is resolved and the next ladder has been computed.
    Reordered,
}

/// One ladder line as shown to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRow {
    pub position: usize,
    pub pair: PairId,
    pub players: [String; 2],
    pub last_week_position: Option<usize>,
    pub active: bool,
    pub penalty: Penalty,
    pub score: i32,
    pub requested_slot: TimeSlot,
    pub pod: Option<PodId>,
    pub scheduled_slot: Option<TimeSlot>,
}

pub struct GameSession {
    ladder: Ladder,
    reordered: Option<Ladder>,
    pods: Vec<Pod>,
    grouping_error: Option<GroupingError>,
    tracker: CompletionTracker,
    completions: Receiver<RoundComplete>,
    penalties: PenaltyMap,
    config: LeagueConfig,
    reorderer: Box<dyn LadderReorderer>,
    updated_at: NaiveDateTime,
}

impl GameSession {
    /// Start a session on `ladder` with the pod-swap reorderer.
    pub fn new(ladder: Ladder, config: LeagueConfig) -> Self {
        let reorderer = Box::new(PodSwapReorderer::new(config.penalties));
        Self::with_reorderer(ladder, config, reorderer)
    }

    pub fn with_reorderer(
        ladder: Ladder,
        config: LeagueConfig,
        reorderer: Box<dyn LadderReorderer>,
    ) -> Self {
        let (tracker, completions) = CompletionTracker::new(0);
        let mut session = Self {
            ladder,
            reordered: None,
            pods: Vec::new(),
            grouping_error: None,
            tracker,
            completions,
            penalties: PenaltyMap::new(),
            config,
            reorderer,
            updated_at: Local::now().naive_local(),
        };
        session.admit_flagged_pairs();
        session.regroup();
        session
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    /// Next round's ladder, once the current round has been reordered.
    pub fn reordered_ladder(&self) -> Option<&Ladder> {
        self.reordered.as_ref()
    }

    pub fn pair(&self, id: PairId) -> Option<&Pair> {
        self.ladder.find(id)
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn pod(&self, id: PodId) -> Option<&Pod> {
        self.pods.iter().find(|p| p.id() == id)
    }

    /// Why the active set has no pods, if it cannot be grouped.
    pub fn grouping_error(&self) -> Option<&GroupingError> {
        self.grouping_error.as_ref()
    }

    pub fn config(&self) -> &LeagueConfig {
        &self.config
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    // ── Active set ───────────────────────────────────────────────────

    pub fn is_active(&self, id: PairId) -> bool {
        self.ladder.find(id).is_some_and(|p| p.active)
    }

    pub fn active_pairs(&self) -> Vec<&Pair> {
        self.ladder.pairs().iter().filter(|p| p.active).collect()
    }

    pub fn passive_pairs(&self) -> Vec<&Pair> {
        self.ladder.pairs().iter().filter(|p| !p.active).collect()
    }

    /// The first player of `id` who already plays for an active pair,
    /// including `id` itself.
    pub fn already_active_player(&self, id: PairId) -> Result<Option<&Player>, SessionError> {
        let pair = self.ladder.find(id).ok_or(SessionError::PairNotFound(id))?;
        let active: Vec<&Pair> = self.active_pairs();
        Ok(pair
            .players
            .iter()
            .find(|player| active.iter().any(|p| p.has_player(player.id))))
    }

    /// Mark `id` as playing this round. Returns false when the pair is
    /// unknown, already playing, or shares a player with a playing pair.
    pub fn set_pair_active(&mut self, id: PairId) -> bool {
        match self.already_active_player(id) {
            Err(_) => {
                warn!(pair = %id, "cannot activate unknown pair");
                return false;
            }
            Ok(Some(player)) => {
                warn!(pair = %id, player = %player, "player is already playing this round");
                return false;
            }
            Ok(None) => {}
        }
        if let Some(pair) = self.ladder.find_mut(id) {
            pair.active = true;
        }
        info!(pair = %id, "pair activated");
        self.regroup();
        true
    }

    /// Take `id` out of this round. Returns false if it was not playing.
    pub fn set_pair_inactive(&mut self, id: PairId) -> bool {
        match self.ladder.find_mut(id) {
            Some(pair) if pair.active => pair.active = false,
            _ => return false,
        }
        info!(pair = %id, "pair deactivated");
        self.regroup();
        true
    }

    // ── Penalties ────────────────────────────────────────────────────

    pub fn set_penalty(&mut self, id: PairId, penalty: Penalty) -> Result<(), SessionError> {
        if !self.ladder.contains(id) {
            return Err(SessionError::PairNotFound(id));
        }
        self.penalties.insert(id, penalty);
        self.recompute_next_ladder()?;
        self.touch();
        Ok(())
    }

    pub fn remove_penalty(&mut self, id: PairId) -> Option<Penalty> {
        let removed = self.penalties.remove(&id);
        if removed.is_some() {
            self.recompute_or_warn();
            self.touch();
        }
        removed
    }

    pub fn penalties(&self) -> &PenaltyMap {
        &self.penalties
    }

    // ── Results ──────────────────────────────────────────────────────

    /// Replace all results of `pod` with `rows` of `"W"`/`"L"`/`""` markers.
    pub fn record_results<S: AsRef<str>>(
        &mut self,
        pod: PodId,
        rows: &[Vec<S>],
    ) -> Result<RoundStatus, SessionError> {
        let grid = ResultGrid::parse(rows)?;
        self.pod_mut(pod)?.record_results(&grid)?;
        self.after_result_entry(pod)
    }

    /// Record one match of `pod`: `winner` beat `loser`.
    pub fn record_match(
        &mut self,
        pod: PodId,
        index: usize,
        winner: PairId,
        loser: PairId,
    ) -> Result<RoundStatus, SessionError> {
        self.pod_mut(pod)?.record_match(index, winner, loser)?;
        self.after_result_entry(pod)
    }

    // ── Round ────────────────────────────────────────────────────────

    /// Compute next round's ladder from the current results and penalties.
    pub fn reorder_ladder(&mut self) -> Result<&Ladder, SessionError> {
        if let Some(err) = &self.grouping_error {
            return Err(err.clone().into());
        }
        let outcome = self
            .reorderer
            .reorder(&self.ladder, &self.pods, &self.penalties)?;
        info!(
            pairs = outcome.ladder.len(),
            pods = self.pods.len(),
            penalties = self.penalties.len(),
            "ladder reordered"
        );
        self.touch();
        Ok(self.reordered.insert(outcome.ladder))
    }

    /// Make the reordered ladder current and start a fresh round.
    pub fn advance_round(&mut self) -> Result<(), SessionError> {
        let next = self.reordered.take().ok_or(SessionError::NothingToAdvance)?;
        self.ladder = next;
        self.penalties.clear();
        info!(pairs = self.ladder.len(), "round advanced");
        self.regroup();
        Ok(())
    }

    // ── Ladder edits ─────────────────────────────────────────────────

    /// Insert `pair` at 0-based `index`. A pair flagged active joins the round
    /// only if none of its players is already playing.
    pub fn add_pair_at(&mut self, index: usize, mut pair: Pair) -> Result<(), SessionError> {
        let wants_active = pair.active;
        let id = pair.id;
        pair.active = false;
        pair.last_week_position = Some(index + 1);
        self.ladder.insert_at(index, pair)?;
        info!(pair = %id, position = index + 1, "pair added");
        if wants_active && self.set_pair_active(id) {
            return Ok(());
        }
        self.recompute_next_ladder()?;
        self.touch();
        Ok(())
    }

    pub fn add_pair_at_end(&mut self, pair: Pair) -> Result<(), SessionError> {
        self.add_pair_at(self.ladder.len(), pair)
    }

    /// Remove `id` from the ladder along with its penalty. Returns false if it
    /// was not on the ladder.
    pub fn remove_pair(&mut self, id: PairId) -> bool {
        let was_active = self.is_active(id);
        if !self.ladder.remove_pair(id) {
            return false;
        }
        self.penalties.remove(&id);
        info!(pair = %id, "pair removed");
        if was_active {
            self.regroup();
        } else {
            self.recompute_or_warn();
            self.touch();
        }
        true
    }

    /// Swap in a whole new ladder, e.g. an imported one. Current positions
    /// become the last-week positions and the round starts over.
    pub fn replace_ladder(&mut self, ladder: Ladder) {
        self.ladder = ladder;
        for (position, pair) in self.ladder.iter_mut().enumerate() {
            pair.last_week_position = Some(position + 1);
        }
        self.reordered = None;
        self.penalties.clear();
        self.admit_flagged_pairs();
        info!(pairs = self.ladder.len(), "ladder replaced");
        self.regroup();
    }

    // ── Time slots ───────────────────────────────────────────────────

    /// Record the slot `id` asked for and reschedule the pods.
    pub fn set_time_slot(&mut self, id: PairId, slot: TimeSlot) -> Result<(), SessionError> {
        let pair = self
            .ladder
            .find_mut(id)
            .ok_or(SessionError::PairNotFound(id))?;
        pair.time_slot = slot;
        distribute_pods(&mut self.pods, &self.ladder, &self.config.schedule);
        self.touch();
        Ok(())
    }

    /// Requested slot of every pair.
    pub fn time_slots(&self) -> BTreeMap<PairId, TimeSlot> {
        self.ladder
            .pairs()
            .iter()
            .map(|p| (p.id, p.time_slot))
            .collect()
    }

    // ── View ─────────────────────────────────────────────────────────

    pub fn view(&self) -> Vec<LadderRow> {
        self.ladder
            .iter_positions()
            .map(|(position, pair)| {
                let pod = self.pods.iter().find(|pod| pod.contains(pair.id));
                LadderRow {
                    position,
                    pair: pair.id,
                    players: [pair.players[0].to_string(), pair.players[1].to_string()],
                    last_week_position: pair.last_week_position,
                    active: pair.active,
                    penalty: self
                        .penalties
                        .get(&pair.id)
                        .copied()
                        .unwrap_or(pair.penalty),
                    score: pair.score,
                    requested_slot: pair.time_slot,
                    pod: pod.map(Pod::id),
                    scheduled_slot: pod.map(|p| p.time_slot),
                }
            })
            .collect()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn pod_mut(&mut self, id: PodId) -> Result<&mut Pod, SessionError> {
        self.pods
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(SessionError::UnknownPod(id))
    }

    /// Copy pod scores onto the ladder, update the tracker and reorder if the
    /// round just completed.
    fn after_result_entry(&mut self, id: PodId) -> Result<RoundStatus, SessionError> {
        let (resolved, scores) = match self.pod(id) {
            Some(pod) => (pod.is_resolved(), pod.scores()),
            None => return Err(SessionError::UnknownPod(id)),
        };
        for (pair_id, score) in scores {
            if let Some(pair) = self.ladder.find_mut(pair_id) {
                pair.score = score;
            }
        }
        self.touch();

        let already_fired = self.tracker.has_fired();
        if resolved {
            self.tracker.mark_resolved(id);
        } else {
            self.tracker.mark_unresolved(id);
        }

        if let Ok(done) = self.completions.try_recv() {
            info!(pods = done.pods, "all pods resolved");
            self.reorder_ladder()?;
            return Ok(RoundStatus::Reordered);
        }
        // A correction after the round fired recomputes the next ladder.
        if already_fired && self.pods.iter().all(Pod::is_resolved) {
            self.reorder_ladder()?;
            return Ok(RoundStatus::Reordered);
        }
        let pods_remaining = self.pods.iter().filter(|p| !p.is_resolved()).count();
        Ok(RoundStatus::Pending { pods_remaining })
    }

    /// Bring the next ladder in line with an edit to the penalties or the
    /// passive pairs. Recomputes if a next ladder exists or the round is
    /// complete; otherwise there is nothing to update.
    fn recompute_next_ladder(&mut self) -> Result<(), SessionError> {
        let had_next = self.reordered.take().is_some();
        let round_done = self.tracker.has_fired() && self.pods.iter().all(Pod::is_resolved);
        if had_next || round_done {
            self.reorder_ladder()?;
        }
        Ok(())
    }

    fn recompute_or_warn(&mut self) {
        if let Err(err) = self.recompute_next_ladder() {
            warn!(error = %err, "next ladder discarded");
        }
    }

    /// Keep the first of any pairs flagged active that share a player.
    fn admit_flagged_pairs(&mut self) {
        let mut admitted: Vec<usize> = Vec::new();
        let pairs = self.ladder.pairs();
        let mut rejected: Vec<PairId> = Vec::new();
        for (index, pair) in pairs.iter().enumerate().filter(|(_, p)| p.active) {
            if admitted.iter().any(|&i| pairs[i].shares_player_with(pair)) {
                rejected.push(pair.id);
            } else {
                admitted.push(index);
            }
        }
        for id in rejected {
            warn!(pair = %id, "player is already playing this round");
            if let Some(pair) = self.ladder.find_mut(id) {
                pair.active = false;
            }
        }
    }

    /// Rebuild the pods from the active set with a fresh tracker.
    fn regroup(&mut self) {
        let active: Vec<PairId> = self.active_pairs().iter().map(|p| p.id).collect();
        let (pods, error) = match group_pods(&active) {
            Ok(pods) => (pods, None),
            Err(err) => {
                warn!(error = %err, "active pairs cannot be grouped");
                (Vec::new(), Some(err))
            }
        };
        self.pods = pods;
        self.grouping_error = error;
        distribute_pods(&mut self.pods, &self.ladder, &self.config.schedule);

        for pair in self.ladder.iter_mut() {
            pair.score = 0;
        }
        let (tracker, completions) = CompletionTracker::new(self.pods.len());
        self.tracker = tracker;
        self.completions = completions;
        self.reordered = None;
        info!(active = active.len(), pods = self.pods.len(), "pods regrouped");
        self.touch();
    }

    fn touch(&mut self) {
        let now = Local::now().naive_local();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
