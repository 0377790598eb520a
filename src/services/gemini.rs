use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::config::GeminiSettings;
use crate::models::ModelInfo;
use crate::services::model_client::{ModelClient, ModelClientError};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MODEL_PREFIX: &str = "models/";
const LIST_PAGE_SIZE: &str = "100";

/// Gemini API client
///
/// Handles all communication with the Generative Language API:
/// - Selecting a usable model at startup
/// - Generating content from text or audio
/// - Listing models for diagnostics
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client bound to a specific model, without contacting the API
    pub fn new(
        base_url: String,
        api_key: String,
        model: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ModelClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: qualify_model_name(model),
            client: builder.build()?,
        })
    }

    /// Create a client bound to the first candidate model the API recognises.
    ///
    /// Candidates are probed in order; the first successful lookup wins.
    pub async fn connect(settings: &GeminiSettings) -> Result<Self, ModelClientError> {
        let timeout = settings.request_timeout_secs.map(Duration::from_secs);
        let mut client = Self::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            "",
            timeout,
        )?;

        let mut failures = Vec::new();
        for candidate in &settings.candidate_models {
            let name = qualify_model_name(candidate);
            match client.describe_model(&name).await {
                Ok(()) => {
                    tracing::info!("Loaded model: {}", name);
                    client.model = name;
                    return Ok(client);
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        if failures.is_empty() {
            return Err(ModelClientError::NoModelAvailable(
                "no candidate models configured".to_string(),
            ));
        }
        Err(ModelClientError::NoModelAvailable(failures.join("; ")))
    }

    /// Check that the API knows `name` and the key may use it
    async fn describe_model(&self, name: &str) -> Result<(), ModelClientError> {
        let url = format!("{}/{}", self.base_url, name);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }

    async fn generate(&self, parts: Vec<Part<'_>>) -> Result<String, ModelClientError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
        };

        tracing::debug!(model = %self.model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: GenerateContentResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ModelClientError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        body.into_text().map(|text| text.trim().to_string())
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_from_text(&self, prompt: &str) -> Result<String, ModelClientError> {
        self.generate(vec![Part::Text { text: prompt }]).await
    }

    async fn generate_from_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, ModelClientError> {
        let inline = Part::InlineData {
            inline_data: Blob {
                mime_type,
                data: STANDARD.encode(audio),
            },
        };
        self.generate(vec![inline, Part::Text { text: instruction }]).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ModelClientError> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .query(&[("pageSize", LIST_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListModelsResponse = check_status(request.send().await?)
                .await?
                .json()
                .await
                .map_err(|e| ModelClientError::InvalidResponse(format!("Failed to parse model list: {}", e)))?;

            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} models", models.len());
        Ok(models)
    }
}

/// Prefix bare model names with `models/`
fn qualify_model_name(name: &str) -> String {
    if name.is_empty() || name.starts_with(MODEL_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", MODEL_PREFIX, name)
    }
}

/// Turn a non-success response into an `ApiError` carrying the upstream message
async fn check_status(response: Response) -> Result<Response, ModelClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);

    Err(ModelClientError::ApiError {
        status: status.as_u16(),
        message,
    })
}

// Wire types for the Generative Language REST API

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Result<String, ModelClientError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(ModelClientError::EmptyResponse(match block_reason {
                Some(reason) => format!("prompt blocked ({})", reason),
                None => "no candidates returned".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelClientError::EmptyResponse(format!(
                "finish reason {}",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ApiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiModel {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<ApiModel> for ModelInfo {
    fn from(model: ApiModel) -> Self {
        Self {
            name: model.name,
            display_name: model.display_name,
            supported_methods: model.supported_generation_methods,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
