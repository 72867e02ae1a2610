use serde::{Deserialize, Serialize};
use std::fmt;

/// Facial-expression category carried by generated text tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionTag {
    #[default]
    Neutral,
    Happy,
    Angry,
    Sad,
    Relaxed,
}

impl EmotionTag {
    pub const ALL: [EmotionTag; 5] = [
        EmotionTag::Neutral,
        EmotionTag::Happy,
        EmotionTag::Angry,
        EmotionTag::Sad,
        EmotionTag::Relaxed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionTag::Neutral => "neutral",
            EmotionTag::Happy => "happy",
            EmotionTag::Angry => "angry",
            EmotionTag::Sad => "sad",
            EmotionTag::Relaxed => "relaxed",
        }
    }

    /// Case-sensitive lookup of a tag token (`"happy"`, not `"Happy"`)
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == s)
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, EmotionTag::Neutral)
    }
}

impl fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice-synthesis style understood by Koeiromap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TalkStyle {
    #[default]
    Talk,
    Happy,
    Sad,
    Angry,
    Fear,
    Surprised,
}

impl TalkStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TalkStyle::Talk => "talk",
            TalkStyle::Happy => "happy",
            TalkStyle::Sad => "sad",
            TalkStyle::Angry => "angry",
            TalkStyle::Fear => "fear",
            TalkStyle::Surprised => "surprised",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "talk" => Some(TalkStyle::Talk),
            "happy" => Some(TalkStyle::Happy),
            "sad" => Some(TalkStyle::Sad),
            "angry" => Some(TalkStyle::Angry),
            "fear" => Some(TalkStyle::Fear),
            "surprised" => Some(TalkStyle::Surprised),
            _ => None,
        }
    }

    /// Styles the free Koemotion tier accepts
    pub fn is_free_tier(&self) -> bool {
        matches!(self, TalkStyle::Talk | TalkStyle::Happy | TalkStyle::Sad)
    }
}

impl fmt::Display for TalkStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VRM 1.0 expression preset names addressable in the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionPreset {
    Neutral,
    Happy,
    Angry,
    Sad,
    Relaxed,
    Surprised,
    Aa,
    Ih,
    Ou,
    Ee,
    Oh,
    Blink,
    BlinkLeft,
    BlinkRight,
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
}

impl ExpressionPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionPreset::Neutral => "neutral",
            ExpressionPreset::Happy => "happy",
            ExpressionPreset::Angry => "angry",
            ExpressionPreset::Sad => "sad",
            ExpressionPreset::Relaxed => "relaxed",
            ExpressionPreset::Surprised => "surprised",
            ExpressionPreset::Aa => "aa",
            ExpressionPreset::Ih => "ih",
            ExpressionPreset::Ou => "ou",
            ExpressionPreset::Ee => "ee",
            ExpressionPreset::Oh => "oh",
            ExpressionPreset::Blink => "blink",
            ExpressionPreset::BlinkLeft => "blinkLeft",
            ExpressionPreset::BlinkRight => "blinkRight",
            ExpressionPreset::LookUp => "lookUp",
            ExpressionPreset::LookDown => "lookDown",
            ExpressionPreset::LookLeft => "lookLeft",
            ExpressionPreset::LookRight => "lookRight",
        }
    }

    /// Mouth shapes used for lip-sync overlays
    pub fn is_mouth(&self) -> bool {
        matches!(
            self,
            ExpressionPreset::Aa
                | ExpressionPreset::Ih
                | ExpressionPreset::Ou
                | ExpressionPreset::Ee
                | ExpressionPreset::Oh
        )
    }
}

impl From<EmotionTag> for ExpressionPreset {
    fn from(tag: EmotionTag) -> Self {
        match tag {
            EmotionTag::Neutral => ExpressionPreset::Neutral,
            EmotionTag::Happy => ExpressionPreset::Happy,
            EmotionTag::Angry => ExpressionPreset::Angry,
            EmotionTag::Sad => ExpressionPreset::Sad,
            EmotionTag::Relaxed => ExpressionPreset::Relaxed,
        }
    }
}

impl fmt::Display for ExpressionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Koeiromap speaker coordinates, passed through unchanged into every screenplay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    pub speaker_x: f64,
    pub speaker_y: f64,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            speaker_x: 3.0,
            speaker_y: 3.0,
        }
    }
}

impl VoiceParams {
    pub fn new(speaker_x: f64, speaker_y: f64) -> Self {
        Self { speaker_x, speaker_y }
    }

    /// Validate speaker coordinates
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("speakerX", self.speaker_x), ("speakerY", self.speaker_y)] {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number", name));
            }
            if !(-10.0..=10.0).contains(&value) {
                return Err(format!("{} must be between -10.0 and 10.0", name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_tag_lookup_is_case_sensitive() {
        assert_eq!(EmotionTag::from_name("happy"), Some(EmotionTag::Happy));
        assert_eq!(EmotionTag::from_name("relaxed"), Some(EmotionTag::Relaxed));
        assert_eq!(EmotionTag::from_name("Happy"), None);
        assert_eq!(EmotionTag::from_name("surprised"), None);
        assert_eq!(EmotionTag::from_name(""), None);
    }

    #[test]
    fn test_emotion_tag_serde_lowercase() {
        let json = serde_json::to_string(&EmotionTag::Angry).unwrap();
        assert_eq!(json, "\"angry\"");
        let tag: EmotionTag = serde_json::from_str("\"sad\"").unwrap();
        assert_eq!(tag, EmotionTag::Sad);
    }

    #[test]
    fn test_preset_names_match_vrm() {
        assert_eq!(ExpressionPreset::BlinkLeft.as_str(), "blinkLeft");
        assert_eq!(
            serde_json::to_string(&ExpressionPreset::LookRight).unwrap(),
            "\"lookRight\""
        );
        assert_eq!(ExpressionPreset::from(EmotionTag::Relaxed), ExpressionPreset::Relaxed);
        assert!(ExpressionPreset::Aa.is_mouth());
        assert!(!ExpressionPreset::Happy.is_mouth());
    }

    #[test]
    fn test_talk_style_free_tier() {
        assert!(TalkStyle::Talk.is_free_tier());
        assert!(TalkStyle::Sad.is_free_tier());
        assert!(!TalkStyle::Fear.is_free_tier());
        assert_eq!(TalkStyle::from_name("surprised"), Some(TalkStyle::Surprised));
        assert_eq!(TalkStyle::from_name("whisper"), None);
    }

    #[test]
    fn test_voice_params_validation() {
        assert!(VoiceParams::default().validate().is_ok());
        assert!(VoiceParams::new(10.0, -10.0).validate().is_ok());
        assert!(VoiceParams::new(10.5, 0.0).validate().is_err());
        assert!(VoiceParams::new(0.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_voice_params_camel_case() {
        let json = serde_json::to_value(VoiceParams::new(1.5, -2.0)).unwrap();
        assert_eq!(json["speakerX"], 1.5);
        assert_eq!(json["speakerY"], -2.0);
    }
}
