use serde_json::Value;
use crate::models::Recommendation;

/// Markdown fence markers removed before decoding, longest first
const FENCE_MARKERS: [&str; 2] = ["```json", "```"];

const RECOMMENDATION_KEY: &str = "recommendation";

/// Remove every markdown code-fence marker from `text`, wherever it appears.
///
/// Partial or unbalanced fences are stripped too.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
        .trim()
        .to_string()
}

/// Convert a raw model reply into a recommendation.
///
/// # Rules
/// 1. The reply is trimmed; this trimmed text is the fallback value
/// 2. Code fences are stripped and the rest is decoded as JSON
/// 3. A JSON object with a `recommendation` key yields that value unchanged
/// 4. Anything else (no key, not an object, not JSON) yields the fallback
///
/// The result is never checked against the expected categories.
pub fn normalize_reply(raw: &str) -> Recommendation {
    let decision_text = raw.trim();
    let cleaned = strip_code_fences(decision_text);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(mut fields)) => match fields.remove(RECOMMENDATION_KEY) {
            Some(value) => Recommendation::new(value),
            None => {
                tracing::debug!("Model reply JSON has no recommendation field, passing text through");
                Recommendation::text(decision_text)
            }
        },
        Ok(_) => {
            tracing::debug!("Model reply JSON is not an object, passing text through");
            Recommendation::text(decision_text)
        }
        Err(e) => {
            tracing::debug!("Model reply is not JSON ({}), passing text through", e);
            Recommendation::text(decision_text)
        }
    }
}
