use serde::{Deserialize, Serialize};

/// Response of `GET /courses`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStats {
    /// Number of indexed courses.
    pub total_courses: u64,

    /// Titles of the indexed courses.
    #[serde(default)]
    pub course_titles: Vec<String>,
}
