//! Expression controller: base emotion, lip-sync overlay and blink
//! coordination for one avatar session
//!
//! The controller remembers the active emotion so it can zero it before the
//! next one is applied, and it defers applying a new emotion until any blink
//! in progress has finished so the blink is not visually cut short.

use crate::blink::AutoBlink;
use crate::capability::{BlinkControl, ExpressionSink, NoopBlink, NoopExpressionSink};
use crate::schedule::{DeferredWrites, ScheduledWrite};
use chatvrm_core::{EmotionTag, ExpressionConfig, ExpressionPreset};
use std::sync::Arc;
use tracing::{debug, warn};

/// Mouth-shape weight layered on top of the base expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LipSyncOverlay {
    pub preset: ExpressionPreset,
    pub value: f32,
}

/// Logical expression state of one avatar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpressionState {
    pub base: EmotionTag,
    pub overlay: Option<LipSyncOverlay>,
}

pub struct ExpressionController {
    sink: Arc<dyn ExpressionSink>,
    blink: Box<dyn BlinkControl>,
    state: ExpressionState,
    writes: DeferredWrites,
    neutral_gain: f32,
    emotive_gain: f32,
}

impl ExpressionController {
    /// Controller with no presentation layer and no blink subsystem.
    /// Logical state is still tracked.
    pub fn new(config: &ExpressionConfig) -> Self {
        Self::with_capabilities(config, None, None)
    }

    /// Bind whichever capabilities the model provides; missing ones are
    /// replaced with no-ops for the controller's whole lifetime
    pub fn with_capabilities(
        config: &ExpressionConfig,
        sink: Option<Arc<dyn ExpressionSink>>,
        blink: Option<Box<dyn BlinkControl>>,
    ) -> Self {
        let sink = sink.unwrap_or_else(|| {
            warn!("No expression presentation layer bound; expression writes are disabled");
            Arc::new(NoopExpressionSink)
        });
        let blink = blink.unwrap_or_else(|| Box::new(NoopBlink));

        Self {
            sink,
            blink,
            state: ExpressionState::default(),
            writes: DeferredWrites::new(),
            neutral_gain: config.neutral_lip_sync_gain,
            emotive_gain: config.emotive_lip_sync_gain,
        }
    }

    /// Controller for a model with expression support: auto-blink (when
    /// enabled in `config`) writes to the same presentation layer
    pub fn for_model(config: &ExpressionConfig, sink: Arc<dyn ExpressionSink>) -> Self {
        let blink: Box<dyn BlinkControl> = if config.auto_blink {
            Box::new(AutoBlink::new(sink.clone(), config))
        } else {
            Box::new(NoopBlink)
        };
        Self::with_capabilities(config, Some(sink), Some(blink))
    }

    pub fn state(&self) -> ExpressionState {
        self.state
    }

    pub fn base(&self) -> EmotionTag {
        self.state.base
    }

    pub fn overlay(&self) -> Option<LipSyncOverlay> {
        self.state.overlay
    }

    /// Seconds elapsed on the controller's render clock
    pub fn clock(&self) -> f64 {
        self.writes.clock()
    }

    /// Expression writes armed by `play_emotion` that have not fired yet
    pub fn pending_writes(&self) -> &[ScheduledWrite] {
        self.writes.pending()
    }

    /// Switch the base expression
    ///
    /// The previous emotive expression is zeroed right away. Neutral resumes
    /// blinking; any other emotion suppresses it and is weighted on once the
    /// blink in progress (if any) has finished. Re-playing the current
    /// emotion is not deduplicated.
    pub fn play_emotion(&mut self, preset: EmotionTag) {
        if !self.state.base.is_neutral() {
            self.sink.set_value(self.state.base.into(), 0.0);
            debug!("Resetting {} to 0", self.state.base);
        }

        if preset.is_neutral() {
            self.blink.set_enable(true);
            self.state.base = preset;
            debug!("Expression set to neutral, auto-blink enabled");
            return;
        }

        let t = self.blink.set_enable(false);
        self.state.base = preset;
        let write = self.writes.schedule(t, preset.into(), 1.0);
        debug!(
            "Expression set to {}, auto-blink disabled, weight applies at {:.3}s",
            preset, write.due
        );
    }

    /// Replace the lip-sync overlay, zeroing the previous mouth preset first
    pub fn lip_sync(&mut self, preset: ExpressionPreset, value: f32) {
        if let Some(previous) = self.state.overlay {
            self.sink.set_value(previous.preset, 0.0);
        }
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.state.overlay = Some(LipSyncOverlay { preset, value });
    }

    /// Per-frame tick: advances blinking and the deferred writes, then
    /// reasserts the overlay weight
    pub fn update(&mut self, delta: f64) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        self.blink.update(delta);

        for write in self.writes.advance(delta) {
            self.sink.set_value(write.preset, write.weight);
            debug!("Applied {} with weight {} after delay", write.preset, write.weight);
        }

        if let Some(overlay) = self.state.overlay {
            self.sink.set_value(overlay.preset, self.overlay_weight(overlay.value));
        }
    }

    /// Emotive presets already deform the mouth, so the overlay is weaker
    /// while one is active
    fn overlay_weight(&self, value: f32) -> f32 {
        if self.state.base.is_neutral() {
            value * self.neutral_gain
        } else {
            value * self.emotive_gain
        }
    }
}
