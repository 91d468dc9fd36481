//! Slash command parsing for the chat front end.
//!
//! Lines that start with `/` control the client instead of being sent to the
//! API as a query.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new conversation.
    NewChat,

    /// Reload and show the list of past chats.
    History,

    /// Open a past chat read-only, by 1-based list position or session id.
    Open(String),

    /// Close the read-only view.
    Close,

    /// Reload and show the course catalogue.
    Courses,

    /// Toggle between the light and dark theme.
    Theme,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be submitted as a query.
///
/// # Examples
///
/// ```
/// # use course_chat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/new"), Some(ChatCommand::NewChat));
/// assert_eq!(parse_command("/open 2"), Some(ChatCommand::Open("2".to_string())));
/// assert!(parse_command("What is covered in lesson 3?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match (command.as_str(), argument) {
        ("new" | "clear", None) => ChatCommand::NewChat,
        ("history", None) => ChatCommand::History,
        ("open", Some(target)) => ChatCommand::Open(target.to_string()),
        ("open", None) => {
            ChatCommand::Invalid("/open requires a list number or session id".to_string())
        }
        ("close", None) => ChatCommand::Close,
        ("courses", None) => ChatCommand::Courses,
        ("theme", None) => ChatCommand::Theme,
        ("help" | "?", _) => ChatCommand::Help,
        ("quit" | "exit" | "q", _) => ChatCommand::Quit,
        (
            "new" | "clear" | "history" | "close" | "courses" | "theme",
            Some(_),
        ) => ChatCommand::Invalid(format!("/{command} takes no argument")),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new chat
  /history               Show previous chats
  /open <n|session_id>   Open a previous chat read-only
  /close                 Close the read-only chat
  /courses               Show the course catalogue
  /theme                 Switch between light and dark theme
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent as a question."#
}
