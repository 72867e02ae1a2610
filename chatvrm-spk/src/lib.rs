//! chatvrm-spk: voice synthesis for screenplays
//!
//! Provides text-to-speech with:
//! - The legacy Koeiromap endpoint and the Koemotion free tier
//! - A `VoiceSynthesizer` seam for alternative or stubbed engines
//! - Decoding of returned base64 audio

pub mod audio;
pub mod error;
pub mod koeiromap;
pub mod synthesizer;

pub use audio::{decode_audio, AudioClip};
pub use error::SpeechError;
pub use koeiromap::{free_tier_style, KoeiromapClient, VoiceResponse};
pub use synthesizer::{synthesize_voice, VoiceSynthesizer};
