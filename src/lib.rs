// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod markup;
pub mod render;
pub mod types;

mod observability;

// Re-exports
pub use client::{CourseApi, CourseClient};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
