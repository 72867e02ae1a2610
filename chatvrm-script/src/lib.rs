//! chatvrm-script: from generated text to screenplays
//!
//! - Sentence segmentation into bounded, lossless chunks
//! - Emotion-tag extraction with carry-forward across chunks
//! - Replaceable voice-style policy

pub mod segmenter;
pub mod screenplay;

pub use segmenter::{segment, Segmenter, Segments};
pub use screenplay::{
    EmotiveStylePolicy, FreeTierStylePolicy, Screenplay, ScreenplayBuilder, Talk, TalkStylePolicy,
};

use chatvrm_core::{SegmenterConfig, VoiceParams};

/// Segment raw text and build one screenplay per chunk
pub fn text_to_screenplay(text: &str, voice: VoiceParams, config: &SegmenterConfig) -> Vec<Screenplay> {
    let segmenter = Segmenter::new(config);
    ScreenplayBuilder::new().build(segmenter.split(text), voice)
}
