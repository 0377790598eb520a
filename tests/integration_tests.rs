// Integration tests for the triage HTTP surface

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use triage_relay::models::ModelInfo;
use triage_relay::routes::{configure_routes, AppState};
use triage_relay::services::{ModelClient, ModelClientError};

/// What the stub model saw on its last generate call
#[derive(Debug, Clone, PartialEq)]
enum SeenInput {
    Text(String),
    Audio { bytes: Vec<u8>, mime_type: String, instruction: String },
}

/// Model client that answers every request with a fixed reply
struct StubModel {
    reply: Result<String, String>,
    models: Result<Vec<ModelInfo>, String>,
    seen: Mutex<Option<SeenInput>>,
}

impl StubModel {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            models: Ok(vec![]),
            seen: Mutex::new(None),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            models: Err(message.to_string()),
            seen: Mutex::new(None),
        }
    }

    fn with_models(models: Vec<ModelInfo>) -> Self {
        Self {
            reply: Ok(String::new()),
            models: Ok(models),
            seen: Mutex::new(None),
        }
    }

    fn seen(&self) -> Option<SeenInput> {
        self.seen.lock().unwrap().clone()
    }

    fn answer(&self) -> Result<String, ModelClientError> {
        self.reply.clone().map_err(|message| ModelClientError::ApiError { status: 503, message })
    }
}

#[async_trait]
impl ModelClient for StubModel {
    fn model_name(&self) -> &str {
        "models/stub"
    }

    async fn generate_from_text(&self, prompt: &str) -> Result<String, ModelClientError> {
        *self.seen.lock().unwrap() = Some(SeenInput::Text(prompt.to_string()));
        self.answer()
    }

    async fn generate_from_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String, ModelClientError> {
        *self.seen.lock().unwrap() = Some(SeenInput::Audio {
            bytes: audio.to_vec(),
            mime_type: mime_type.to_string(),
            instruction: instruction.to_string(),
        });
        self.answer()
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ModelClientError> {
        self.models.clone().map_err(ModelClientError::InvalidResponse)
    }
}

fn state_for(model: Arc<StubModel>) -> AppState {
    AppState {
        model,
        max_audio_bytes: 1024,
    }
}

macro_rules! app_with {
    ($model:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(state_for($model.clone())))
                .configure(configure_routes),
        )
        .await
    };
}

fn text_request(message: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/process_text")
        .set_json(json!({ "message": message }))
}

fn audio_request(field: &str, audio: &[u8]) -> test::TestRequest {
    let boundary = "triage-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"clip.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(audio);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    test::TestRequest::post()
        .uri("/process_audio")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(body)
}

#[actix_web::test]
async fn test_health_check_is_independent_of_model() {
    let model = Arc::new(StubModel::failing("model unavailable"));
    let app = app_with!(model);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "ok", "message": "Backend is running"}));
    assert!(model.seen().is_none());
}

#[actix_web::test]
async fn test_process_text_json_reply() {
    let model = Arc::new(StubModel::replying(r#"{"recommendation": "Hospital"}"#));
    let app = app_with!(model);

    let resp = test::call_service(&app, text_request("My arm is broken and bleeding").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"recommendation": "Hospital"}));

    match model.seen() {
        Some(SeenInput::Text(prompt)) => {
            assert!(prompt.contains("\"My arm is broken and bleeding\""));
            assert!(prompt.contains("'Hospital' or just a 'Safe-Place'"));
        }
        other => panic!("unexpected model input: {:?}", other),
    }
}

#[actix_web::test]
async fn test_process_text_fenced_reply() {
    let model = Arc::new(StubModel::replying("```json\n{\"recommendation\": \"Safe-Place\"}\n```"));
    let app = app_with!(model);

    let resp = test::call_service(&app, text_request("We lost our house").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"recommendation": "Safe-Place"}));
}

#[actix_web::test]
async fn test_process_text_plain_text_passthrough() {
    let model = Arc::new(StubModel::replying("Send them to a hospital immediately"));
    let app = app_with!(model);

    let resp = test::call_service(&app, text_request("He is unconscious").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"recommendation": "Send them to a hospital immediately"}));
}

#[actix_web::test]
async fn test_process_text_json_without_recommendation() {
    let model = Arc::new(StubModel::replying(r#"{"foo": "bar"}"#));
    let app = app_with!(model);

    let resp = test::call_service(&app, text_request("Help").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"recommendation": "{\"foo\": \"bar\"}"}));
}

#[actix_web::test]
async fn test_process_text_recommendation_is_always_a_string() {
    for message in ["a", "Flood water up to my chest", "ñ 🚑"] {
        let model = Arc::new(StubModel::replying("Safe-Place please"));
        let app = app_with!(model);

        let resp = test::call_service(&app, text_request(message).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "message {:?}", message);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["recommendation"].is_string());
    }
}

#[actix_web::test]
async fn test_process_text_upstream_failure() {
    let model = Arc::new(StubModel::failing("quota exceeded"));
    let app = app_with!(model);

    let resp = test::call_service(&app, text_request("Help").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error processing text: "));
    assert!(detail.contains("quota exceeded"));
}

#[actix_web::test]
async fn test_process_text_missing_message_is_rejected() {
    let model = Arc::new(StubModel::replying("Hospital"));
    let app = app_with!(model);

    let req = test::TestRequest::post()
        .uri("/process_text")
        .set_json(json!({ "text": "wrong field" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());
    assert!(model.seen().is_none());
}

#[actix_web::test]
async fn test_process_text_whitespace_message_reaches_model() {
    for message in ["   ", "\n", "\t "] {
        let model = Arc::new(StubModel::replying("{\"recommendation\": \"Hospital\"}"));
        let app = app_with!(model);

        let resp = test::call_service(&app, text_request(message).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "message {:?}", message);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"recommendation": "Hospital"}));
        assert!(matches!(model.seen(), Some(SeenInput::Text(_))));
    }
}

#[actix_web::test]
async fn test_process_text_empty_message_is_rejected() {
    let model = Arc::new(StubModel::replying("Hospital"));
    let app = app_with!(model);

    let resp = test::call_service(&app, text_request("").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"detail": "message must not be empty"}));
    assert!(model.seen().is_none());
}

#[actix_web::test]
async fn test_process_audio_forwards_clip() {
    let model = Arc::new(StubModel::replying("```json\n{\"recommendation\": \"Hospital\"}\n```"));
    let app = app_with!(model);

    let resp = test::call_service(&app, audio_request("file", b"webm-bytes").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"recommendation": "Hospital"}));

    match model.seen() {
        Some(SeenInput::Audio { bytes, mime_type, instruction }) => {
            assert_eq!(bytes, b"webm-bytes".to_vec());
            assert_eq!(mime_type, "audio/webm");
            assert!(instruction.starts_with("Listen carefully to this audio from a disaster victim."));
        }
        other => panic!("unexpected model input: {:?}", other),
    }
}

#[actix_web::test]
async fn test_process_audio_empty_file() {
    let model = Arc::new(StubModel::replying("Hospital"));
    let app = app_with!(model);

    let resp = test::call_service(&app, audio_request("file", b"").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"detail": "No audio data received"}));
    assert!(model.seen().is_none());
}

#[actix_web::test]
async fn test_process_audio_wrong_field_counts_as_empty() {
    let model = Arc::new(StubModel::replying("Hospital"));
    let app = app_with!(model);

    let resp = test::call_service(&app, audio_request("recording", b"webm-bytes").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "No audio data received");
}

#[actix_web::test]
async fn test_process_audio_too_large() {
    let model = Arc::new(StubModel::replying("Hospital"));
    let app = app_with!(model);

    let resp = test::call_service(&app, audio_request("file", &vec![7u8; 2048]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(model.seen().is_none());
}

#[actix_web::test]
async fn test_process_audio_upstream_failure() {
    let model = Arc::new(StubModel::failing("deadline exceeded"));
    let app = app_with!(model);

    let resp = test::call_service(&app, audio_request("file", b"webm-bytes").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error processing audio: "));
    assert!(detail.contains("deadline exceeded"));
}

#[actix_web::test]
async fn test_list_models_filters_generation_models() {
    let model = Arc::new(StubModel::with_models(vec![
        ModelInfo {
            name: "models/gemini-2.0-flash".to_string(),
            display_name: "Gemini 2.0 Flash".to_string(),
            supported_methods: vec!["generateContent".to_string(), "countTokens".to_string()],
        },
        ModelInfo {
            name: "models/text-embedding-004".to_string(),
            display_name: "Text Embedding 004".to_string(),
            supported_methods: vec!["embedContent".to_string()],
        },
    ]));
    let app = app_with!(model);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/list-models").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({"available_models": [{
            "name": "models/gemini-2.0-flash",
            "display_name": "Gemini 2.0 Flash",
            "supported_methods": ["generateContent", "countTokens"]
        }]})
    );
}

#[actix_web::test]
async fn test_list_models_failure_still_succeeds() {
    let model = Arc::new(StubModel::failing("permission denied"));
    let app = app_with!(model);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/list-models").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["available_models"], json!([]));
    assert!(body["error"].as_str().unwrap().contains("permission denied"));
}
