//! Voice synthesis over screenplay talks

use crate::audio::{decode_audio, AudioClip};
use crate::error::SpeechError;
use crate::koeiromap::{KoeiromapClient, VoiceResponse};
use async_trait::async_trait;
use chatvrm_script::Talk;
use tracing::{debug, info};

/// Anything that can voice a `Talk`
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Synthesize one talk. `api_key` overrides any configured key.
    async fn synthesize(&self, talk: &Talk, api_key: Option<&str>) -> Result<VoiceResponse, SpeechError>;

    fn name(&self) -> &str;
}

#[async_trait]
impl VoiceSynthesizer for KoeiromapClient {
    /// Uses the Koemotion free tier when a key is available, the legacy
    /// endpoint otherwise
    async fn synthesize(&self, talk: &Talk, api_key: Option<&str>) -> Result<VoiceResponse, SpeechError> {
        let key = api_key
            .filter(|k| !k.is_empty())
            .or(self.config().api_key.as_deref());

        match key {
            Some(key) => {
                self.koeiromap_free_v1(&talk.message, talk.speaker_x, talk.speaker_y, talk.style, key)
                    .await
            }
            None => {
                debug!("No Koemotion key, using legacy endpoint");
                self.koeiromap_v0(&talk.message, talk.speaker_x, talk.speaker_y, talk.style)
                    .await
            }
        }
    }

    fn name(&self) -> &str {
        "Koeiromap"
    }
}

/// Synthesize `talk` and decode the returned audio
pub async fn synthesize_voice(
    synthesizer: &dyn VoiceSynthesizer,
    talk: &Talk,
    api_key: Option<&str>,
) -> Result<AudioClip, SpeechError> {
    let response = synthesizer.synthesize(talk, api_key).await?;
    let clip = decode_audio(&response.audio)?;
    info!(
        "{} synthesized {} bytes of {}",
        synthesizer.name(),
        clip.data.len(),
        clip.mime_type
    );
    Ok(clip)
}
