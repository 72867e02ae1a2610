//! Automatic eye blinking

use crate::capability::{BlinkControl, ExpressionSink};
use chatvrm_core::{ExpressionConfig, ExpressionPreset};
use std::sync::Arc;
use tracing::trace;

/// Open/close blink cycle driven by render ticks
///
/// The eyes stay open for `blink_open_secs`, close for `blink_close_secs`,
/// then reopen. While suppressed, a blink already in progress still
/// completes but no new one starts.
pub struct AutoBlink {
    sink: Arc<dyn ExpressionSink>,
    remaining: f64,
    is_open: bool,
    enabled: bool,
    close_secs: f64,
    open_secs: f64,
}

impl AutoBlink {
    pub fn new(sink: Arc<dyn ExpressionSink>, config: &ExpressionConfig) -> Self {
        Self {
            sink,
            remaining: 0.0,
            is_open: true,
            enabled: true,
            close_secs: config.blink_close_secs,
            open_secs: config.blink_open_secs,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn close(&mut self) {
        self.is_open = false;
        self.remaining = self.close_secs;
        self.sink.set_value(ExpressionPreset::Blink, 1.0);
        trace!("Blink: eyes closed");
    }

    fn open(&mut self) {
        self.is_open = true;
        self.remaining = self.open_secs;
        self.sink.set_value(ExpressionPreset::Blink, 0.0);
        trace!("Blink: eyes opened");
    }
}

impl BlinkControl for AutoBlink {
    fn set_enable(&mut self, enabled: bool) -> f64 {
        self.enabled = enabled;
        if self.is_open {
            0.0
        } else {
            self.remaining.max(0.0)
        }
    }

    fn update(&mut self, delta: f64) {
        if self.remaining > 0.0 {
            self.remaining -= delta;
            return;
        }

        if self.is_open && self.enabled {
            self.close();
            return;
        }

        self.open();
    }
}
