//! Terminal rendering of chat state.
//!
//! This module provides the [`Renderer`] trait and a plain-text
//! implementation with optional ANSI styling.  Assistant answers are markdown
//! and are walked with `pulldown-cmark` into styled terminal text.

use std::borrow::Cow;
use std::io::{self, Write};

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::chat::theme::Theme;
use crate::chat::transcript::{MessageId, MessageNode, NodeBody, Transcript};
use crate::chat::views::{
    COURSES_ERROR_PLACEHOLDER, ChatModal, CourseStatsView, CourseTitles, HistoryView,
    LOADING_PLACEHOLDER, NO_COURSES_PLACEHOLDER,
};
use crate::types::{Message, Role, Source};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the loading line and sources).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text.
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Return to column zero and erase the line.
const ERASE_LINE: &str = "\r\x1b[2K";

/// Colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Speaker labels and headings.
    pub accent: &'static str,
    /// Inline code and code blocks.
    pub code: &'static str,
    /// Link targets.
    pub link: &'static str,
    /// Errors and alerts.
    pub error: &'static str,
}

impl Palette {
    /// The palette for `theme`.
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                accent: "\x1b[36m",
                code: "\x1b[33m",
                link: "\x1b[34m",
                error: "\x1b[31m",
            },
            Theme::Light => Palette {
                accent: "\x1b[34m",
                code: "\x1b[35m",
                link: "\x1b[36m",
                error: "\x1b[31m",
            },
        }
    }
}

/// Trait for rendering chat state.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Brings the display up to date with `transcript`.
    ///
    /// Only nodes the renderer has not shown yet are printed.  A replaced
    /// transcript starts a fresh view.
    fn sync_transcript(&mut self, transcript: &Transcript);

    /// Print the history list.
    fn print_history(&mut self, history: &HistoryView);

    /// Print the course count and titles.
    fn print_course_stats(&mut self, stats: &CourseStatsView);

    /// Print a past chat opened read-only.
    fn print_modal(&mut self, modal: &ChatModal);

    /// Print an alert the user must acknowledge.
    fn print_alert(&mut self, alert: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Switches the palette.
    fn set_theme(&mut self, theme: Theme) {
        _ = theme;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    epoch: u64,
    last: Option<MessageId>,
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
    palette: Palette,
    echo_user: bool,
    cursor: Option<Cursor>,
    loading_shown: bool,
}

impl PlainTextRenderer {
    /// Creates a renderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a renderer on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), use_color)
    }

    /// Creates a renderer on an arbitrary writer.
    pub fn with_writer(out: Box<dyn Write + Send>, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            palette: Palette::for_theme(Theme::default()),
            echo_user: false,
            cursor: None,
            loading_shown: false,
        }
    }

    /// Print user messages from the transcript too.
    ///
    /// Off by default, since the line editor has already shown what the user
    /// typed.
    pub fn echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn clear_loading(&mut self) {
        if self.loading_shown {
            if self.use_color {
                self.write(ERASE_LINE);
            } else {
                self.write("\n");
            }
            self.loading_shown = false;
        }
    }

    fn print_node(&mut self, node: &MessageNode) {
        match &node.body {
            NodeBody::Loading => {
                let line = self.styled(ANSI_DIM, LOADING_PLACEHOLDER);
                self.write(&line);
                self.loading_shown = true;
            }
            NodeBody::Message { message, .. } => {
                if message.role == Role::User && !self.echo_user {
                    return;
                }
                self.print_message(message);
            }
        }
    }

    fn print_message(&mut self, message: &Message) {
        let label = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        let label = self.styled(&format!("{ANSI_BOLD}{}", self.palette.accent), label);
        let body = match message.role {
            Role::User => printable(message.content.trim_end()).into_owned(),
            Role::Assistant => markdown_to_terminal(&message.content, self.style()),
        };
        self.write(&format!("{label}: {body}\n"));
        if !message.sources.is_empty() {
            let sources = format_sources(&message.sources);
            let sources = self.styled(ANSI_DIM, &sources);
            self.write(&sources);
        }
        self.write("\n");
    }

    fn style(&self) -> Option<&Palette> {
        self.use_color.then_some(&self.palette)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn sync_transcript(&mut self, transcript: &Transcript) {
        let epoch = transcript.epoch();
        let last = match self.cursor {
            Some(cursor) if cursor.epoch == epoch => cursor.last,
            Some(_) => {
                self.clear_loading();
                self.write("\n");
                None
            }
            None => None,
        };
        let fresh = transcript.nodes_after(last);
        if fresh.is_empty() {
            self.cursor = Some(Cursor { epoch, last });
            return;
        }
        for node in fresh {
            self.clear_loading();
            self.print_node(node);
        }
        self.cursor = Some(Cursor {
            epoch,
            last: fresh.last().map(|node| node.id),
        });
        self.flush();
    }

    fn print_history(&mut self, history: &HistoryView) {
        self.clear_loading();
        let heading = self.styled(ANSI_BOLD, "Previous chats");
        self.write(&format!("{heading}\n"));
        if let Some(placeholder) = history.placeholder() {
            self.write(&format!("  {placeholder}\n"));
        } else {
            for (index, item) in history.items().iter().enumerate() {
                let id = self.styled(ANSI_DIM, &format!("({})", printable(&item.session_id)));
                self.write(&format!("  {}. {} {id}\n", index + 1, printable(&item.title)));
            }
        }
        self.flush();
    }

    fn print_course_stats(&mut self, stats: &CourseStatsView) {
        self.clear_loading();
        let heading = self.styled(ANSI_BOLD, "Courses");
        self.write(&format!("{heading}: {}\n", stats.total_courses));
        match &stats.titles {
            CourseTitles::Loading => self.write(&format!("  {LOADING_PLACEHOLDER}\n")),
            CourseTitles::Error => {
                let line = self.styled(self.palette.error, COURSES_ERROR_PLACEHOLDER);
                self.write(&format!("  {line}\n"));
            }
            CourseTitles::Loaded(titles) if titles.is_empty() => {
                self.write(&format!("  {NO_COURSES_PLACEHOLDER}\n"));
            }
            CourseTitles::Loaded(titles) => {
                for title in titles {
                    self.write(&format!("  - {}\n", printable(title)));
                }
            }
        }
        self.flush();
    }

    fn print_modal(&mut self, modal: &ChatModal) {
        self.clear_loading();
        let title = modal.title.as_deref().unwrap_or(&modal.session_id);
        let header = self.styled(ANSI_BOLD, &format!("=== {} (read-only) ===", printable(title)));
        self.write(&format!("\n{header}\n\n"));
        for message in &modal.messages {
            self.print_message(message);
        }
        let footer = self.styled(ANSI_DIM, "Type /close to return to the current chat.");
        self.write(&format!("{footer}\n"));
        self.flush();
    }

    fn print_alert(&mut self, alert: &str) {
        self.clear_loading();
        let line = self.styled(&format!("{ANSI_BOLD}{}", self.palette.error), &printable(alert));
        self.write(&format!("\n[!] {line}\n"));
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_loading();
        let line = self.styled(self.palette.error, &format!("Error: {error}"));
        self.write(&format!("{line}\n"));
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.clear_loading();
        self.write(&format!("{info}\n"));
        self.flush();
    }

    fn set_theme(&mut self, theme: Theme) {
        self.palette = Palette::for_theme(theme);
    }
}

/// Drops control characters other than newline and tab, so text from the
/// server cannot emit terminal escape sequences.
fn printable(text: &str) -> Cow<'_, str> {
    let keep = |c: char| !c.is_control() || c == '\n' || c == '\t';
    if text.chars().all(keep) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| keep(c)).collect())
    }
}

/// Lists sources beneath an answer, with link targets after their titles.
fn format_sources(sources: &[Source]) -> String {
    let mut out = String::from("Sources:\n");
    for source in sources {
        match source.link() {
            Some(url) => out.push_str(&format!(
                "  - {} <{}>\n",
                printable(&source.title),
                printable(url)
            )),
            None => out.push_str(&format!("  - {}\n", printable(&source.title))),
        }
    }
    out
}

/// Renders markdown as terminal text, styled with `palette` when given.
pub fn markdown_to_terminal(markdown: &str, palette: Option<&Palette>) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut links: Vec<String> = Vec::new();
    let style = |out: &mut String, code: &str| {
        if palette.is_some() {
            out.push_str(code);
        }
    };
    let reset = |out: &mut String| {
        if palette.is_some() {
            out.push_str(ANSI_RESET);
        }
    };

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => out.push_str(if lists.is_empty() { "\n\n" } else { "\n" }),
            Event::Start(Tag::Heading { level, .. }) => {
                style(&mut out, ANSI_BOLD);
                if let Some(palette) = palette {
                    out.push_str(palette.accent);
                }
                if level == HeadingLevel::H1 {
                    out.push_str("# ");
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                reset(&mut out);
                out.push_str("\n\n");
            }
            Event::Start(Tag::Strong) => style(&mut out, ANSI_BOLD),
            Event::Start(Tag::Emphasis) => style(&mut out, ANSI_ITALIC),
            Event::End(TagEnd::Strong | TagEnd::Emphasis) => reset(&mut out),
            Event::Start(Tag::CodeBlock(_)) => {
                if let Some(palette) = palette {
                    out.push_str(palette.code);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                reset(&mut out);
                out.push('\n');
            }
            Event::Start(Tag::List(start)) => {
                if !lists.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                let depth = lists.len().saturating_sub(1);
                out.push_str(&"  ".repeat(depth));
                match lists.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{n}. "));
                        *n += 1;
                    }
                    _ => out.push_str("- "),
                }
            }
            Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                links.push(printable(&dest_url).into_owned())
            }
            Event::End(TagEnd::Link) => {
                if let Some(url) = links.pop() {
                    let target = format!(" <{url}>");
                    match palette {
                        Some(palette) => {
                            out.push_str(palette.link);
                            out.push_str(&target);
                            out.push_str(ANSI_RESET);
                        }
                        None => out.push_str(&target),
                    }
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                out.push_str(&printable(&text))
            }
            Event::Code(code) => match palette {
                Some(palette) => {
                    out.push_str(palette.code);
                    out.push_str(&printable(&code));
                    out.push_str(ANSI_RESET);
                }
                None => {
                    out.push('`');
                    out.push_str(&printable(&code));
                    out.push('`');
                }
            },
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => out.push_str("----\n\n"),
            _ => {}
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn take(&self) -> String {
            let text = self.text();
            self.0.lock().unwrap().clear();
            text
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn renderer(use_color: bool) -> (PlainTextRenderer, Captured) {
        let captured = Captured::default();
        let renderer = PlainTextRenderer::with_writer(Box::new(captured.clone()), use_color);
        (renderer, captured)
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn markdown_without_color() {
        let text = markdown_to_terminal(
            "# Lesson\n\nUse **RAG** with `embeddings`.\n\n- one\n- [two](https://x.test)\n",
            None,
        );
        assert_eq!(
            text,
            "# Lesson\n\nUse RAG with `embeddings`.\n\n- one\n- two <https://x.test>"
        );
    }

    #[test]
    fn ordered_lists_are_numbered() {
        let text = markdown_to_terminal("1. first\n2. second\n", None);
        assert_eq!(text, "1. first\n2. second");
    }

    #[test]
    fn markdown_with_color_styles_strong() {
        let palette = Palette::for_theme(Theme::Dark);
        let text = markdown_to_terminal("**bold**", Some(&palette));
        assert_eq!(text, format!("{ANSI_BOLD}bold{ANSI_RESET}"));
    }

    #[test]
    fn transcript_is_printed_incrementally() {
        let (mut renderer, captured) = renderer(false);
        let mut transcript = Transcript::new();
        transcript.add_message(Message::assistant("Welcome!", Vec::new()), true);
        renderer.sync_transcript(&transcript);
        assert_eq!(captured.take(), "assistant: Welcome!\n\n");

        transcript.add_message(Message::user("question"), false);
        let loading = transcript.push_loading();
        renderer.sync_transcript(&transcript);
        assert_eq!(captured.take(), LOADING_PLACEHOLDER);

        // Nothing new: nothing printed.
        renderer.sync_transcript(&transcript);
        assert_eq!(captured.take(), "");

        transcript.resolve_loading(
            loading,
            Message::assistant("answer", vec![Source::new("Notes")]),
        );
        renderer.sync_transcript(&transcript);
        assert_eq!(
            captured.take(),
            "\nassistant: answer\nSources:\n  - Notes\n\n"
        );
    }

    #[test]
    fn echo_user_prints_user_messages() {
        let (renderer, captured) = renderer(false);
        let mut renderer = renderer.echo_user(true);
        let mut transcript = Transcript::new();
        transcript.add_message(Message::user("hello"), false);
        renderer.sync_transcript(&transcript);
        assert_eq!(captured.text(), "you: hello\n\n");
    }

    #[test]
    fn replaced_transcript_starts_over() {
        let (mut renderer, captured) = renderer(false);
        let mut transcript = Transcript::new();
        transcript.add_message(Message::assistant("first", Vec::new()), false);
        renderer.sync_transcript(&transcript);
        captured.take();

        transcript.clear();
        transcript.add_message(Message::assistant("second", Vec::new()), true);
        renderer.sync_transcript(&transcript);
        assert_eq!(captured.take(), "\nassistant: second\n\n");
    }

    #[test]
    fn loading_line_is_erased_with_color() {
        let (mut renderer, captured) = renderer(true);
        let mut transcript = Transcript::new();
        let loading = transcript.push_loading();
        renderer.sync_transcript(&transcript);
        transcript.resolve_loading(loading, Message::assistant("done", Vec::new()));
        renderer.sync_transcript(&transcript);
        assert!(captured.text().contains(ERASE_LINE));
    }

    #[test]
    fn history_and_stats() {
        let (mut renderer, captured) = renderer(false);
        renderer.print_history(&HistoryView::Empty);
        assert_eq!(captured.take(), "Previous chats\n  No previous chats\n");

        renderer.print_history(&HistoryView::from_summaries(vec![
            crate::types::ChatSummary::new("s1", "What is MCP?"),
        ]));
        assert_eq!(captured.take(), "Previous chats\n  1. What is MCP? (s1)\n");

        renderer.print_course_stats(&CourseStatsView::failed());
        assert_eq!(captured.take(), "Courses: 0\n  Failed to load courses\n");
    }

    #[test]
    fn sources_show_link_targets() {
        let text = format_sources(&[
            Source::with_url("Lecture 1", "https://x.test/1"),
            Source::new("Notes"),
        ]);
        assert_eq!(
            text,
            "Sources:\n  - Lecture 1 <https://x.test/1>\n  - Notes\n"
        );
    }

    #[test]
    fn control_characters_are_not_written() {
        let (renderer, captured) = renderer(false);
        let mut renderer = renderer.echo_user(true);
        let mut transcript = Transcript::new();
        transcript.add_message(Message::user("hi\x1b[2J there"), false);
        transcript.add_message(
            Message::assistant(
                "clear\x1b]0;owned\x07 <b>\x1b[31mred</b>\n\n`x\x08`",
                vec![Source::new("Notes\x1b[1A")],
            ),
            false,
        );
        renderer.sync_transcript(&transcript);

        let text = captured.text();
        assert!(!text.contains('\x1b'));
        assert!(!text.contains('\x07'));
        assert!(!text.contains('\x08'));
        assert!(text.contains("you: hi[2J there\n"));
        assert!(text.contains("  - Notes[1A\n"));
        assert_eq!(printable("tab\tand\nnewline"), "tab\tand\nnewline");
    }

    #[test]
    fn palettes_differ_by_theme() {
        assert_ne!(
            Palette::for_theme(Theme::Dark),
            Palette::for_theme(Theme::Light)
        );
    }
}
