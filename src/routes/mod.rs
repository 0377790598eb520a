// Route exports
pub mod cors;
pub mod errors;
pub mod triage;

use actix_web::{error, web, HttpRequest};
use errors::ApiError;

pub use cors::build_cors;
pub use triage::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .configure(triage::configure);
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::InvalidRequest(format!("Invalid request body: {}", err)).into()
}
