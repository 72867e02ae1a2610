use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chatvrm_core::{SegmenterConfig, TalkStyle, VoiceParams};
use chatvrm_script::{text_to_screenplay, Screenplay, Talk};
use chatvrm_spk::VoiceSynthesizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared state of the HTTP API
#[derive(Clone)]
pub struct ApiState {
    pub synthesizer: Arc<dyn VoiceSynthesizer>,
    pub segmenter: Arc<SegmenterConfig>,
    /// Voice used when a screenplay request leaves speaker params out
    pub voice: VoiceParams,
}

impl ApiState {
    pub fn new(synthesizer: Arc<dyn VoiceSynthesizer>, segmenter: SegmenterConfig, voice: VoiceParams) -> Self {
        Self {
            synthesizer,
            segmenter: Arc::new(segmenter),
            voice,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    pub message: String,
    pub speaker_x: f64,
    pub speaker_y: f64,
    pub style: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenplayRequest {
    pub text: String,
    #[serde(default)]
    pub speaker_x: Option<f64>,
    #[serde(default)]
    pub speaker_y: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ScreenplayResponse {
    pub screenplays: Vec<Screenplay>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tts", post(tts_handler))
        .route("/api/screenplay", post(screenplay_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Voice one message through the configured synthesizer
async fn tts_handler(State(state): State<ApiState>, Json(req): Json<TtsRequest>) -> impl IntoResponse {
    let style = TalkStyle::from_name(&req.style).unwrap_or_else(|| {
        debug!("Unknown talk style '{}', using talk", req.style);
        TalkStyle::Talk
    });
    let talk = Talk {
        style,
        speaker_x: req.speaker_x,
        speaker_y: req.speaker_y,
        message: req.message,
    };

    match state.synthesizer.synthesize(&talk, req.api_key.as_deref()).await {
        Ok(voice) => (StatusCode::OK, Json(voice)).into_response(),
        Err(e) => {
            error!("[api/tts] Error calling {}: {}", state.synthesizer.name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: format!("TTS API Error: {}", e),
                }),
            )
                .into_response()
        }
    }
}

async fn screenplay_handler(
    State(state): State<ApiState>,
    Json(req): Json<ScreenplayRequest>,
) -> impl IntoResponse {
    let voice = VoiceParams::new(
        req.speaker_x.unwrap_or(state.voice.speaker_x),
        req.speaker_y.unwrap_or(state.voice.speaker_y),
    );
    if let Err(e) = voice.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { message: e })).into_response();
    }

    let screenplays = text_to_screenplay(&req.text, voice, &state.segmenter);
    debug!("Built {} screenplays", screenplays.len());
    Json(ScreenplayResponse { screenplays }).into_response()
}
