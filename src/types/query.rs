use serde::{Deserialize, Serialize};

use crate::types::Source;

/// Body of `POST /query`.
///
/// `session_id` is serialized as `null` before the API has assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question.
    pub query: String,

    /// The current session, if the API has assigned one.
    pub session_id: Option<String>,
}

impl QueryRequest {
    /// Creates a new query request.
    pub fn new(query: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            query: query.into(),
            session_id,
        }
    }
}

/// Response of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Markdown answer text.
    pub answer: String,

    /// Citations for the answer.
    #[serde(default)]
    pub sources: Vec<Source>,

    /// The session the answer belongs to.
    pub session_id: String,
}
