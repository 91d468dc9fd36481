//! Display state for the regions outside the transcript.

use crate::types::{ChatSummary, CourseStats, Message};

/// Welcome text inserted at the top of every new session.
pub const WELCOME_MESSAGE: &str = "Welcome to the Course Materials Assistant! I can help you with questions about courses, lessons and specific content. What would you like to know?";

/// Shown in the history list when the server has no chats.
pub const NO_CHATS_PLACEHOLDER: &str = "No previous chats";

/// Shown in the history list when it could not be loaded.
pub const HISTORY_ERROR_PLACEHOLDER: &str = "Failed to load chat history";

/// Shown in the course list when stats could not be loaded.
pub const COURSES_ERROR_PLACEHOLDER: &str = "Failed to load courses";

/// Shown in the course list when the server reports no courses.
pub const NO_COURSES_PLACEHOLDER: &str = "No courses available";

/// Shown in the history and course regions before the first load finishes.
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// The history list region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryView {
    /// Nothing loaded yet.
    #[default]
    Loading,
    /// The server has no previous chats.
    Empty,
    /// Selectable past chats, most recent first.
    Items(Vec<ChatSummary>),
    /// The list could not be loaded.
    Error,
}

impl HistoryView {
    /// Builds the view from a successful response.
    pub fn from_summaries(summaries: Vec<ChatSummary>) -> Self {
        if summaries.is_empty() {
            HistoryView::Empty
        } else {
            HistoryView::Items(summaries)
        }
    }

    /// The selectable items; empty for every placeholder state.
    pub fn items(&self) -> &[ChatSummary] {
        match self {
            HistoryView::Items(items) => items,
            _ => &[],
        }
    }

    /// The placeholder text, if the view is showing one.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            HistoryView::Loading => Some(LOADING_PLACEHOLDER),
            HistoryView::Empty => Some(NO_CHATS_PLACEHOLDER),
            HistoryView::Items(_) => None,
            HistoryView::Error => Some(HISTORY_ERROR_PLACEHOLDER),
        }
    }
}

/// The course title part of the stats region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CourseTitles {
    /// Nothing loaded yet.
    #[default]
    Loading,
    /// Titles reported by the server.
    Loaded(Vec<String>),
    /// The stats could not be loaded.
    Error,
}

/// The course stats region: a count and a list of titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseStatsView {
    /// Displayed course count.  Zero until loaded and after a failure.
    pub total_courses: u64,
    /// Displayed titles.
    pub titles: CourseTitles,
}

impl CourseStatsView {
    /// Builds the view from a successful response.
    pub fn loaded(stats: CourseStats) -> Self {
        Self {
            total_courses: stats.total_courses,
            titles: CourseTitles::Loaded(stats.course_titles),
        }
    }

    /// The fallback shown when the stats could not be loaded.
    pub fn failed() -> Self {
        Self {
            total_courses: 0,
            titles: CourseTitles::Error,
        }
    }
}

/// A past chat opened for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatModal {
    /// The session being viewed.
    pub session_id: String,
    /// Title from the history list, when the chat was opened from it.
    pub title: Option<String>,
    /// Every stored turn, oldest first.
    pub messages: Vec<Message>,
}
