use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recommendation literal for callers who need medical care
pub const HOSPITAL: &str = "Hospital";
/// Recommendation literal for callers who only need shelter
pub const SAFE_PLACE: &str = "Safe-Place";

/// Triage outcome returned to the caller.
///
/// Normally one of [`HOSPITAL`] or [`SAFE_PLACE`], but the model's output is
/// passed through as-is, so any JSON value is possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendation(Value);

impl Recommendation {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Free-text recommendation, used when the reply is not structured
    pub fn text(text: impl Into<String>) -> Self {
        Self(Value::String(text.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Whether the value is exactly one of the two expected categories
    pub fn is_known_category(&self) -> bool {
        matches!(self.as_str(), Some(HOSPITAL) | Some(SAFE_PLACE))
    }
}

impl From<Value> for Recommendation {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A model exposed by the language-model service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_methods.iter().any(|m| m == method)
    }
}

/// Diagnostic model listing. Carries the failure text instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelListing {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub available_models: Vec<ModelInfo>,
}

impl ModelListing {
    pub fn models(available_models: Vec<ModelInfo>) -> Self {
        Self { error: None, available_models }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            available_models: Vec::new(),
        }
    }
}
