use async_trait::async_trait;
use thiserror::Error;
use crate::models::{ModelInfo, ModelListing};

/// Generation method a model must support to be listed as usable
pub const GENERATE_CONTENT: &str = "generateContent";

/// Errors that can occur when talking to the language-model service
#[derive(Debug, Error)]
pub enum ModelClientError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Model returned no text: {0}")]
    EmptyResponse(String),

    #[error("No candidate model could be loaded: {0}")]
    NoModelAvailable(String),
}

/// Connection to a generative language model.
///
/// One instance is built at startup and shared read-only by every request.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier of the model selected at startup
    fn model_name(&self) -> &str;

    /// Send a text prompt and return the trimmed reply
    async fn generate_from_text(&self, prompt: &str) -> Result<String, ModelClientError>;

    /// Send an audio clip followed by an instruction and return the trimmed reply
    async fn generate_from_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, ModelClientError>;

    /// Every model the service exposes
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ModelClientError>;

    /// Models that support content generation. Never fails: errors are
    /// reported inside the listing.
    async fn list_available_models(&self) -> ModelListing {
        match self.list_models().await {
            Ok(models) => ModelListing::models(
                models
                    .into_iter()
                    .filter(|m| m.supports(GENERATE_CONTENT))
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!("Failed to list models: {}", e);
                ModelListing::failed(e.to_string())
            }
        }
    }
}
