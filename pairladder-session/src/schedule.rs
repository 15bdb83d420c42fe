//! Time-slot scheduling — which pods play in which slot.
//!
//! Pairs carry the slot they asked for; pods carry the slot they were
//! scheduled into. A pod goes to the slot most of its members asked for unless
//! that slot is full, in which case it goes to the least loaded slot.

use tracing::debug;

use pairladder_core::{Ladder, Pair, Pod, TimeSlot};

use crate::config::ScheduleConfig;

/// Pairs that asked for `slot`, in ladder order.
pub fn pairs_by_time(pairs: &[Pair], slot: TimeSlot) -> Vec<&Pair> {
    pairs.iter().filter(|p| p.time_slot == slot).collect()
}

pub fn count_by_time(pairs: &[Pair], slot: TimeSlot) -> usize {
    pairs.iter().filter(|p| p.time_slot == slot).count()
}

/// Reset every pair's requested slot to unassigned.
pub fn clear_time_slots(ladder: &mut Ladder) {
    for pair in ladder.iter_mut() {
        pair.time_slot = TimeSlot::Unassigned;
    }
}

/// The playable slot most of `pairs` asked for. Ties go to the earlier slot;
/// no preference at all means the first slot.
pub fn dominant_slot<'a>(pairs: impl IntoIterator<Item = &'a Pair>) -> TimeSlot {
    let mut counts = [0usize; TimeSlot::PLAYABLE.len()];
    for pair in pairs {
        if let Some(i) = TimeSlot::PLAYABLE.iter().position(|&s| s == pair.time_slot) {
            counts[i] += 1;
        }
    }
    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    TimeSlot::PLAYABLE[best]
}

/// Pairs a single slot may hold for a field of `active` pairs.
pub fn slot_capacity(active: usize, config: &ScheduleConfig) -> usize {
    config
        .max_pairs_per_slot
        .max(active.div_ceil(TimeSlot::PLAYABLE.len()))
}

/// Schedule every pod into a playable slot, in pod order.
///
/// Sets `pod.time_slot` and returns the assigned slots. Member preferences are
/// read from `ladder`; members missing from it count as having no preference.
pub fn distribute_pods(
    pods: &mut [Pod],
    ladder: &Ladder,
    config: &ScheduleConfig,
) -> Vec<TimeSlot> {
    let active: usize = pods.iter().map(Pod::len).sum();
    let capacity = slot_capacity(active, config);
    let mut load = [0usize; TimeSlot::PLAYABLE.len()];

    pods.iter_mut()
        .map(|pod| {
            let preferred = dominant_slot(pod.members().iter().filter_map(|&id| ladder.find(id)));
            let preferred_index = TimeSlot::PLAYABLE
                .iter()
                .position(|&s| s == preferred)
                .unwrap_or(0);

            let index = if load[preferred_index] + pod.len() <= capacity {
                preferred_index
            } else {
                least_loaded(&load)
            };
            load[index] += pod.len();

            let slot = TimeSlot::PLAYABLE[index];
            if slot != preferred {
                debug!(pod = %pod.id(), ?preferred, ?slot, "slot full, pod moved");
            }
            pod.time_slot = slot;
            slot
        })
        .collect()
}

fn least_loaded(load: &[usize]) -> usize {
    let mut best = 0;
    for (i, &l) in load.iter().enumerate() {
        if l < load[best] {
            best = i;
        }
    }
    best
}
