//! Screenplay building: emotion tags in generated text become expression +
//! voice records, one per chunk

use chatvrm_core::{EmotionTag, TalkStyle, VoiceParams};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Utterance handed to voice synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Talk {
    pub style: TalkStyle,
    pub speaker_x: f64,
    pub speaker_y: f64,
    pub message: String,
}

/// Spoken message paired with the facial expression shown while it plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenplay {
    pub expression: EmotionTag,
    pub talk: Talk,
}

/// Chooses the voice style for a resolved expression
pub trait TalkStylePolicy {
    fn style_for(&self, expression: EmotionTag) -> TalkStyle;
}

impl<F> TalkStylePolicy for F
where
    F: Fn(EmotionTag) -> TalkStyle,
{
    fn style_for(&self, expression: EmotionTag) -> TalkStyle {
        self(expression)
    }
}

/// Koemotion's free tier only voices "talk", so every expression maps to it
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeTierStylePolicy;

impl TalkStylePolicy for FreeTierStylePolicy {
    fn style_for(&self, _expression: EmotionTag) -> TalkStyle {
        TalkStyle::Talk
    }
}

/// Voices emotive expressions with their matching style where one exists
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotiveStylePolicy;

impl TalkStylePolicy for EmotiveStylePolicy {
    fn style_for(&self, expression: EmotionTag) -> TalkStyle {
        match expression {
            EmotionTag::Happy => TalkStyle::Happy,
            EmotionTag::Sad => TalkStyle::Sad,
            EmotionTag::Angry => TalkStyle::Angry,
            EmotionTag::Neutral | EmotionTag::Relaxed => TalkStyle::Talk,
        }
    }
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"\[(.*?)\]").expect("Invalid regex pattern"))
}

/// First bracketed token in `chunk`, recognized or not
pub fn first_tag(chunk: &str) -> Option<&str> {
    tag_pattern()
        .captures(chunk)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `chunk` with every bracketed tag removed
pub fn strip_tags(chunk: &str) -> String {
    tag_pattern().replace_all(chunk, "").into_owned()
}

/// Folds tagged chunks into screenplays, carrying the last recognized
/// emotion forward across untagged chunks
#[derive(Debug, Clone, Default)]
pub struct ScreenplayBuilder<P = FreeTierStylePolicy> {
    policy: P,
}

impl ScreenplayBuilder<FreeTierStylePolicy> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: TalkStylePolicy> ScreenplayBuilder<P> {
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    pub fn build<I, S>(&self, chunks: I, voice: VoiceParams) -> Vec<Screenplay>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut prev_expression = EmotionTag::Neutral;

        chunks
            .into_iter()
            .map(|chunk| {
                let chunk = chunk.as_ref();

                if let Some(tag) = first_tag(chunk) {
                    match EmotionTag::from_name(tag) {
                        Some(expression) => prev_expression = expression,
                        None => debug!("Ignoring unknown emotion tag [{}]", tag),
                    }
                }

                let expression = prev_expression;
                Screenplay {
                    expression,
                    talk: Talk {
                        style: self.policy.style_for(expression),
                        speaker_x: voice.speaker_x,
                        speaker_y: voice.speaker_y,
                        message: strip_tags(chunk),
                    },
                }
            })
            .collect()
    }
}

/// Build screenplays with the default free-tier style policy
pub fn build<I, S>(chunks: I, voice: VoiceParams) -> Vec<Screenplay>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ScreenplayBuilder::new().build(chunks, voice)
}
