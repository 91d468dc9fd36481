// Public modules
pub mod chat_summary;
pub mod chat_transcript;
pub mod course_stats;
pub mod message;
pub mod query;
pub mod source;

// Re-exports
pub use chat_summary::ChatSummary;
pub use chat_transcript::ChatTranscript;
pub use course_stats::CourseStats;
pub use message::{Message, Role};
pub use query::{QueryRequest, QueryResponse};
pub use source::Source;
