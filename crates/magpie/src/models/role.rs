use serde::{Deserialize, Serialize};

/// Who authored a message in the conversation history.
///
/// The system prompt travels out of band (a parameter to the provider) and
/// tool results are content variants on user messages, so neither needs a
/// role of its own here; the wire-level `system` and `tool` roles are
/// produced during provider conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
