use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Response of `GET /chat/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTranscript {
    /// Echo of the requested session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Every stored turn, oldest first.
    pub messages: Vec<Message>,
}
