//! Deterministic future events
//!
//! Staggered spawns and phase delays are queued against the simulation
//! clock instead of wall-clock timers. Each entry carries the guard that was
//! current when it was scheduled; when it comes due the tick compares the
//! guard with the live one and silently drops stale entries.

use serde::{Deserialize, Serialize};

use super::progression::LevelPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Compute the wave's required kills and queue its spawns
    StartWave,
    /// One staggered regular spawn (1-based ordinal within the wave)
    SpawnRegular { ordinal: u32 },
    /// Leave `Transition`: rotate the map and reset wave bookkeeping
    EnterNextMap,
}

/// Progression snapshot an event must still match to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseGuard {
    pub phase: LevelPhase,
    /// Number of levels cleared so far
    pub stage: u32,
    pub wave: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub fire_at_ms: f64,
    /// Insertion order, breaks ties between equal fire times
    seq: u64,
    pub action: ScheduledAction,
    pub guard: PhaseGuard,
}

/// Queue sorted by (fire time, insertion order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    queue: Vec<ScheduledEvent>,
    next_seq: u64,
}

impl Schedule {
    pub fn push(&mut self, fire_at_ms: f64, action: ScheduledAction, guard: PhaseGuard) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let at = self
            .queue
            .partition_point(|e| (e.fire_at_ms, e.seq) <= (fire_at_ms, seq));
        self.queue.insert(
            at,
            ScheduledEvent {
                fire_at_ms,
                seq,
                action,
                guard,
            },
        );
    }

    /// Remove and return the earliest event due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<ScheduledEvent> {
        if self.queue.first()?.fire_at_ms <= now_ms {
            Some(self.queue.remove(0))
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
