use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /process_text`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcessTextRequest {
    #[validate(length(min = 1))]
    pub message: String,
}
