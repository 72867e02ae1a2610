//! One-shot expression writes scheduled against the render clock

use chatvrm_core::ExpressionPreset;

/// A presentation write waiting for its due time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledWrite {
    /// Clock time, in seconds, at which the write fires
    pub due: f64,
    /// Arming order, used to break ties between equal due times
    pub seq: u64,
    pub preset: ExpressionPreset,
    pub weight: f32,
}

/// Simulated clock plus the writes armed against it
///
/// Armed writes cannot be cancelled. Writes fire in due-time order, which is
/// not necessarily the order they were armed in.
#[derive(Debug, Clone, Default)]
pub struct DeferredWrites {
    clock: f64,
    next_seq: u64,
    pending: Vec<ScheduledWrite>,
}

impl DeferredWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time in seconds
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Writes armed but not yet fired, in arming order
    pub fn pending(&self) -> &[ScheduledWrite] {
        &self.pending
    }

    /// Arm a write to fire `delay` seconds from now
    pub fn schedule(&mut self, delay: f64, preset: ExpressionPreset, weight: f32) -> ScheduledWrite {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let write = ScheduledWrite {
            due: self.clock + delay,
            seq: self.next_seq,
            preset,
            weight,
        };
        self.next_seq += 1;
        self.pending.push(write);
        write
    }

    /// Advance the clock and return every write that became due, in firing order
    pub fn advance(&mut self, delta: f64) -> Vec<ScheduledWrite> {
        self.clock += delta;

        let clock = self.clock;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|w| w.due <= clock);
        self.pending = pending;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due
    }
}
