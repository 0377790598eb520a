// Service exports
pub mod gemini;
pub mod model_client;

pub use gemini::GeminiClient;
pub use model_client::{ModelClient, ModelClientError, GENERATE_CONTENT};
