use actix_cors::Cors;
use crate::config::CorsSettings;

/// Cross-origin policy for the browser front end.
///
/// Permissive mode echoes any origin and allows credentials. Otherwise only
/// `allowed_origins` may call the API.
pub fn build_cors(settings: &CorsSettings) -> Cors {
    if settings.permissive {
        return Cors::permissive();
    }

    settings
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}
