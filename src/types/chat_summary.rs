use serde::{Deserialize, Serialize};

/// One entry of `GET /chat-history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// The session this entry opens.
    pub session_id: String,

    /// Display title, derived by the server from the first user message.
    pub title: String,

    /// Number of messages in the session, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
}

impl ChatSummary {
    /// Creates a summary without a message count.
    pub fn new(session_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title: title.into(),
            message_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_with_count() {
        let json = serde_json::json!({
            "session_id": "session_3",
            "title": "What is covered in lesson 2...",
            "message_count": 4
        });
        let summary: ChatSummary = serde_json::from_value(json).unwrap();
        assert_eq!(summary.session_id, "session_3");
        assert_eq!(summary.message_count, Some(4));
    }
}
