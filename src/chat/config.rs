//! Configuration types for the chat front end.
//!
//! Command-line arguments are parsed with `arrrg` and resolved into a
//! [`ChatConfig`] with defaults filled in.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::theme::FileStore;
use crate::client::DEFAULT_TIMEOUT;

/// Command-line arguments for the course-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the course API.
    #[arrrg(
        optional,
        "Course API base URL (default: $COURSE_CHAT_API_URL or http://localhost:8000/api/)",
        "URL"
    )]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Where the theme preference is kept.
    #[arrrg(optional, "Preferences file (default: per-user config dir)", "PATH")]
    pub preferences: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for one run of the chat front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Explicit API base URL.  `None` defers to the environment and then the
    /// built-in default.
    pub api_url: Option<String>,

    /// Timeout applied to every request.
    pub timeout: Duration,

    /// Preference file.  `None` keeps preferences in memory only.
    pub preferences_path: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a config with default values.
    ///
    /// Defaults:
    /// - API URL: from the environment, else `http://localhost:8000/api/`
    /// - Timeout: 60 seconds
    /// - Preferences: `course-chat/preferences.json` in the user config dir
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: None,
            timeout: DEFAULT_TIMEOUT,
            preferences_path: FileStore::default_path(),
            use_color: true,
        }
    }

    /// Sets the API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the preference file.  `None` keeps preferences in memory.
    pub fn with_preferences_path(mut self, path: Option<PathBuf>) -> Self {
        self.preferences_path = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            api_url: args.api_url.filter(|url| !url.trim().is_empty()),
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            preferences_path: args
                .preferences
                .map(PathBuf::from)
                .or(defaults.preferences_path),
            use_color: !args.no_color,
        }
    }
}
