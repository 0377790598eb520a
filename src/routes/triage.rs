use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::Instrument;
use validator::Validate;
use crate::core::{normalize_reply, text_prompt, AUDIO_INSTRUCTION, AUDIO_MIME_TYPE};
use crate::models::{HealthResponse, ProcessTextRequest, Recommendation, TriageResponse};
use crate::routes::errors::ApiError;
use crate::services::ModelClient;

/// Multipart field carrying the audio clip
const AUDIO_FIELD: &str = "file";

const EMPTY_MESSAGE: &str = "message must not be empty";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ModelClient>,
    pub max_audio_bytes: usize,
}

/// Configure all triage routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/", web::get().to(health_check))
        .route("/list-models", web::get().to(list_models))
        .route("/process_text", web::post().to(process_text))
        .route("/process_audio", web::post().to(process_audio));
}

/// Health check endpoint. Does not touch the model.
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse::running())
}

/// Models usable for content generation
///
/// GET /list-models
///
/// Always answers 200; failures are reported in the `error` field.
async fn list_models(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.model.list_available_models().await)
}

/// Triage a typed message
///
/// POST /process_text
///
/// Request body:
/// ```json
/// { "message": "string" }
/// ```
async fn process_text(
    state: web::Data<AppState>,
    req: web::Json<ProcessTextRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for process_text request: {:?}", errors);
        return Err(ApiError::InvalidRequest(EMPTY_MESSAGE.to_string()));
    }

    let span = tracing::info_span!("process_text", request_id = %uuid::Uuid::new_v4());
    async move {
        let prompt = text_prompt(&req.message);

        let reply = state.model.generate_from_text(&prompt).await.map_err(|e| {
            tracing::error!("Error processing text: {}", e);
            ApiError::TextProcessing(e)
        })?;

        tracing::info!("Model response (text): {}", reply);
        Ok::<_, ApiError>(recommend(reply))
    }
    .instrument(span)
    .await
}

/// Triage a recorded voice clip
///
/// POST /process_audio
///
/// Multipart form with the clip in the `file` field (audio/webm).
async fn process_audio(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let audio = read_audio(payload, state.max_audio_bytes).await?;
    if audio.is_empty() {
        tracing::info!("Rejected process_audio request without audio data");
        return Err(ApiError::NoAudio);
    }

    let span = tracing::info_span!(
        "process_audio",
        request_id = %uuid::Uuid::new_v4(),
        audio_bytes = audio.len()
    );
    async move {
        let reply = state
            .model
            .generate_from_audio(&audio, AUDIO_MIME_TYPE, AUDIO_INSTRUCTION)
            .await
            .map_err(|e| {
                tracing::error!("Error processing audio: {}", e);
                ApiError::AudioProcessing(e)
            })?;

        tracing::info!("Model response (audio): {}", reply);
        Ok::<_, ApiError>(recommend(reply))
    }
    .instrument(span)
    .await
}

/// Collect the bytes of the audio field, skipping any other fields
async fn read_audio(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut audio = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
    {
        let is_audio = field.name() == Some(AUDIO_FIELD);

        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
        {
            if !is_audio {
                continue;
            }
            if audio.len() + chunk.len() > limit {
                tracing::info!("Rejected audio upload larger than {} bytes", limit);
                return Err(ApiError::AudioTooLarge { limit });
            }
            audio.extend_from_slice(&chunk);
        }
    }

    Ok(audio)
}

fn recommend(reply: String) -> HttpResponse {
    let recommendation: Recommendation = normalize_reply(&reply);
    if !recommendation.is_known_category() {
        tracing::warn!("Recommendation is outside the expected categories: {:?}", recommendation.value());
    }
    HttpResponse::Ok().json(TriageResponse { recommendation })
}
