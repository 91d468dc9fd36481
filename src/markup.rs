//! HTML rendering of chat state.
//!
//! Every function here takes structured records and returns a markup
//! fragment.  User-supplied and server-supplied text is escaped before it is
//! interpolated; assistant answers are rendered from markdown with any raw
//! HTML they contain escaped as text.

use std::fmt::Write;

use pulldown_cmark::{Event, Options, Parser, html};

use crate::chat::theme::Theme;
use crate::chat::transcript::{MessageNode, NodeBody, Transcript};
use crate::chat::views::{
    COURSES_ERROR_PLACEHOLDER, ChatModal, CourseStatsView, CourseTitles, HistoryView,
    LOADING_PLACEHOLDER, NO_COURSES_PLACEHOLDER,
};
use crate::types::{Message, Role, Source};

/// Renders assistant markdown to HTML.
///
/// Raw HTML blocks and inline tags are emitted as escaped text.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Renders one transcript node.
pub fn render_message(node: &MessageNode) -> String {
    match &node.body {
        NodeBody::Loading => format!(
            r#"<div class="message assistant" id="{}"><div class="message-content"><div class="loading"><span></span><span></span><span></span></div></div></div>"#,
            node.id
        ),
        NodeBody::Message { message, welcome } => {
            render_message_body(&node.id.to_string(), message, *welcome)
        }
    }
}

fn render_message_body(id: &str, message: &Message, welcome: bool) -> String {
    let mut class = String::from("message ");
    class.push_str(message.role.as_str());
    if welcome {
        class.push_str(" welcome-message");
    }
    let content = match message.role {
        Role::User => html_escape::encode_text(&message.content).into_owned(),
        Role::Assistant => markdown_to_html(&message.content),
    };
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div class="{class}" id="{}"><div class="message-content">{content}</div>"#,
        html_escape::encode_double_quoted_attribute(id)
    );
    if let Some(sources) = render_sources(&message.sources) {
        out.push_str(&sources);
    }
    out.push_str("</div>");
    out
}

/// Renders the collapsible source list, or `None` when there are no sources.
pub fn render_sources(sources: &[Source]) -> Option<String> {
    if sources.is_empty() {
        return None;
    }
    let items: Vec<String> = sources.iter().map(render_source).collect();
    Some(format!(
        r#"<details class="sources-collapsible"><summary class="sources-header">Sources</summary><div class="sources-content">{}</div></details>"#,
        items.join("")
    ))
}

fn render_source(source: &Source) -> String {
    let title = html_escape::encode_text(&source.title);
    match source.link() {
        Some(url) => format!(
            r#"<a class="source-item source-link" href="{}" target="_blank" rel="noopener noreferrer">{title}</a>"#,
            html_escape::encode_double_quoted_attribute(url)
        ),
        None => format!(r#"<span class="source-item">{title}</span>"#),
    }
}

/// Renders the whole transcript in display order.
pub fn render_transcript(transcript: &Transcript) -> String {
    transcript.nodes().iter().map(render_message).collect()
}

/// Renders the history list, or its placeholder.
pub fn render_history(history: &HistoryView) -> String {
    if let Some(placeholder) = history.placeholder() {
        let class = match history {
            HistoryView::Error => "history-error",
            _ => "history-placeholder",
        };
        return format!(r#"<div class="{class}">{placeholder}</div>"#);
    }
    let mut out = String::new();
    for item in history.items() {
        let _ = write!(
            out,
            r#"<button class="history-item" data-session-id="{}">{}</button>"#,
            html_escape::encode_double_quoted_attribute(&item.session_id),
            html_escape::encode_text(&item.title)
        );
    }
    out
}

/// Renders the course count and title list.
pub fn render_course_stats(stats: &CourseStatsView) -> String {
    let titles = match &stats.titles {
        CourseTitles::Loading => format!(r#"<span class="loading">{LOADING_PLACEHOLDER}</span>"#),
        CourseTitles::Error => format!(r#"<span class="error">{COURSES_ERROR_PLACEHOLDER}</span>"#),
        CourseTitles::Loaded(titles) if titles.is_empty() => {
            format!(r#"<span class="no-courses">{NO_COURSES_PLACEHOLDER}</span>"#)
        }
        CourseTitles::Loaded(titles) => titles
            .iter()
            .map(|title| {
                format!(
                    r#"<div class="course-title-item">{}</div>"#,
                    html_escape::encode_text(title)
                )
            })
            .collect(),
    };
    format!(
        r#"<div class="course-stats"><span class="total-courses">{}</span><div class="course-titles">{titles}</div></div>"#,
        stats.total_courses
    )
}

/// Renders the read-only chat view.
pub fn render_modal(modal: &ChatModal) -> String {
    let title = modal.title.as_deref().unwrap_or("Chat");
    let mut out = format!(
        r#"<div class="chat-modal" data-session-id="{}"><div class="modal-header"><h2>{}</h2><button class="close-modal" aria-label="Close">&times;</button></div><div class="modal-messages">"#,
        html_escape::encode_double_quoted_attribute(&modal.session_id),
        html_escape::encode_text(title)
    );
    for (index, message) in modal.messages.iter().enumerate() {
        out.push_str(&render_message_body(
            &format!("modal-message-{index}"),
            message,
            false,
        ));
    }
    out.push_str("</div></div>");
    out
}

/// Renders the theme toggle control for the current theme.
pub fn render_theme_toggle(theme: Theme) -> String {
    let label = theme.toggle_label();
    format!(
        r#"<button class="theme-toggle" data-theme="{}" aria-label="{label}" title="{label}"></button>"#,
        theme.as_str()
    )
}
