//! Triage Relay - disaster-response triage backed by a generative language model
//!
//! This library forwards a victim's typed message or voice clip to Gemini and
//! reduces the free-text reply to a recommendation, normally "Hospital" or
//! "Safe-Place".

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{normalize_reply, strip_code_fences};
pub use models::{ModelInfo, ModelListing, Recommendation, HOSPITAL, SAFE_PLACE};
pub use routes::{configure_routes, AppState};
pub use services::{GeminiClient, ModelClient, ModelClientError};
