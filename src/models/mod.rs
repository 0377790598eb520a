// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ModelInfo, ModelListing, Recommendation, HOSPITAL, SAFE_PLACE};
pub use requests::ProcessTextRequest;
pub use responses::{ErrorResponse, HealthResponse, TriageResponse};
