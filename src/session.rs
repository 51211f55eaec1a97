use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Correlation token sent with every request of one session.
///
/// Generated once when the chat surface is created and never changed; the
/// server uses it to group prompts, the client attaches no other meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
