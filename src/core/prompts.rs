/// MIME type of audio clips recorded by the web client
pub const AUDIO_MIME_TYPE: &str = "audio/webm";

/// Instruction sent alongside an audio clip
pub const AUDIO_INSTRUCTION: &str = "Listen carefully to this audio from a disaster victim. \
Return JSON {\"recommendation\": \"Hospital\"} \
or {\"recommendation\": \"Safe-Place\"} \
based on the urgency of their condition.";

/// Build the triage prompt for a typed message
pub fn text_prompt(message: &str) -> String {
    format!(
        "The user is in a natural disaster and said: \"{message}\".\n\
         Determine if they need a 'Hospital' or just a 'Safe-Place'.\n\
         Respond strictly with JSON in this format:\n\
         {{\"recommendation\": \"Hospital\"}} or {{\"recommendation\": \"Safe-Place\"}}.\n"
    )
}
