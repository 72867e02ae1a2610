//! Capabilities the expression controller drives: the presentation layer
//! (VRM expression weights) and the eye-blink subsystem
//!
//! Both are optional for a given model. Callers that have neither bind the
//! no-op implementations once, at construction.

use chatvrm_core::ExpressionPreset;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Presentation layer: per-preset expression weights
///
/// Every call is authoritative for that preset's weight at that instant.
/// Implementations are shared between the controller and the blink
/// subsystem, hence `&self`.
pub trait ExpressionSink: Send + Sync {
    fn set_value(&self, preset: ExpressionPreset, weight: f32);
}

/// Eye-blink subsystem
pub trait BlinkControl: Send {
    /// Enable or suppress automatic blinking. Returns the seconds left
    /// until an in-flight blink finishes, or 0 when the eyes are open.
    fn set_enable(&mut self, enabled: bool) -> f64;

    /// Advance the blink animation clock
    fn update(&mut self, delta: f64);
}

/// Presentation layer for models without expression support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExpressionSink;

impl ExpressionSink for NoopExpressionSink {
    fn set_value(&self, _preset: ExpressionPreset, _weight: f32) {}
}

/// Blink subsystem for models without blink support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBlink;

impl BlinkControl for NoopBlink {
    fn set_enable(&mut self, _enabled: bool) -> f64 {
        0.0
    }

    fn update(&mut self, _delta: f64) {}
}

/// In-memory presentation layer that keeps every write in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<(ExpressionPreset, f32)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far, oldest first
    pub fn writes(&self) -> Vec<(ExpressionPreset, f32)> {
        self.writes.lock().clone()
    }

    /// Drain the recorded writes
    pub fn take(&self) -> Vec<(ExpressionPreset, f32)> {
        std::mem::take(&mut *self.writes.lock())
    }

    /// Last weight written to `preset`
    pub fn weight(&self, preset: ExpressionPreset) -> Option<f32> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|(p, _)| *p == preset)
            .map(|(_, w)| *w)
    }

    /// Current weight of every preset written so far
    pub fn snapshot(&self) -> HashMap<ExpressionPreset, f32> {
        self.writes.lock().iter().copied().collect()
    }
}

impl ExpressionSink for RecordingSink {
    fn set_value(&self, preset: ExpressionPreset, weight: f32) {
        self.writes.lock().push((preset, weight));
    }
}
