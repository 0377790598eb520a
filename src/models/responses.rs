use serde::{Deserialize, Serialize};
use crate::models::domain::Recommendation;

/// Response for the triage endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResponse {
    pub recommendation: Recommendation,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn running() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Backend is running".to_string(),
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
