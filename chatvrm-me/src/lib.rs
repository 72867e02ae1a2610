//! chatvrm-me: avatar expression control
//!
//! Provides the per-avatar expression state machine with:
//! - Emotion switching that waits out an in-flight blink
//! - A lip-sync overlay blended against the active emotion
//! - Automatic blinking and optional presentation capabilities

pub mod blink;
pub mod capability;
pub mod expression;
pub mod lip_sync;
pub mod schedule;

pub use blink::AutoBlink;
pub use capability::{BlinkControl, ExpressionSink, NoopBlink, NoopExpressionSink, RecordingSink};
pub use expression::{ExpressionController, ExpressionState, LipSyncOverlay};
pub use lip_sync::LipSyncAnalyzer;
pub use schedule::{DeferredWrites, ScheduledWrite};
