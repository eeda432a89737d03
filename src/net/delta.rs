//! Delta compression for state sync
//!
//! The authoritative peer diffs each tick's full snapshot against the last
//! one it sent and transmits only the top-level fields that changed. The
//! relay repeats the diff against its retained room snapshot so a field
//! re-sent unchanged is never forwarded. Receivers replace each present
//! field wholesale; absent fields are left alone.
//!
//! Change detection is structural equality with full f32 precision.

use crate::net::protocol::{GameSnapshot, SyncField};

/// Copy `field` from `current` into `delta` if it differs from `base`.
macro_rules! diff_field {
    ($delta:ident, $base:ident, $current:ident, $name:ident) => {
        if let Some(value) = &$current.$name {
            if $base.$name.as_ref() != Some(value) {
                $delta.$name = Some(value.clone());
            }
        }
    };
}

/// Replace `field` in `target` with the value from `delta` when present.
macro_rules! merge_field {
    ($target:ident, $delta:ident, $name:ident) => {
        if let Some(value) = &$delta.$name {
            $target.$name = Some(value.clone());
        }
    };
}

/// Fields of `current` that differ from `base`.
///
/// Returns `None` when nothing changed. Fields absent from `current` are
/// treated as unchanged, not cleared.
pub fn generate_delta(base: &GameSnapshot, current: &GameSnapshot) -> Option<GameSnapshot> {
    let mut delta = GameSnapshot::default();
    diff_field!(delta, base, current, paddle_x);
    diff_field!(delta, base, current, balls);
    diff_field!(delta, base, current, bricks);
    diff_field!(delta, base, current, guide_line);
    diff_field!(delta, base, current, power_ups);
    diff_field!(delta, base, current, scores);
    diff_field!(delta, base, current, projectiles);
    diff_field!(delta, base, current, guns_state);
    diff_field!(delta, base, current, level);

    if delta.is_empty() {
        None
    } else {
        Some(delta)
    }
}

/// Overwrite every field present in `delta`
pub fn apply_delta(target: &mut GameSnapshot, delta: &GameSnapshot) {
    merge_field!(target, delta, paddle_x);
    merge_field!(target, delta, balls);
    merge_field!(target, delta, bricks);
    merge_field!(target, delta, guide_line);
    merge_field!(target, delta, power_ups);
    merge_field!(target, delta, scores);
    merge_field!(target, delta, projectiles);
    merge_field!(target, delta, guns_state);
    merge_field!(target, delta, level);
}

/// Tracks what this peer last transmitted
#[derive(Debug, Default)]
pub struct DeltaTracker {
    last_sent: GameSnapshot,
    deltas_sent: u64,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `current` against the last transmission and record it as sent
    pub fn next_delta(&mut self, current: &GameSnapshot) -> Option<GameSnapshot> {
        let delta = generate_delta(&self.last_sent, current)?;
        apply_delta(&mut self.last_sent, &delta);
        self.deltas_sent += 1;
        Some(delta)
    }

    /// Forget history so the next delta carries the full state
    pub fn reset(&mut self) {
        self.last_sent = GameSnapshot::default();
    }

    pub fn last_sent(&self) -> &GameSnapshot {
        &self.last_sent
    }

    pub fn deltas_sent(&self) -> u64 {
        self.deltas_sent
    }
}

/// Field names, for logs and metrics
pub fn field_names(delta: &GameSnapshot) -> Vec<&'static str> {
    delta.fields().into_iter().map(SyncField::name).collect()
}
