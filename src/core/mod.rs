// Core triage logic exports
pub mod normalizer;
pub mod prompts;

pub use normalizer::{normalize_reply, strip_code_fences};
pub use prompts::{text_prompt, AUDIO_INSTRUCTION, AUDIO_MIME_TYPE};
