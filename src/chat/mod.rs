//! The course-materials chat client.
//!
//! This module holds everything between the HTTP client and a front end:
//!
//! - Session management: new sessions, course stats, history, read-only chats
//! - The request pipeline that sends one query at a time
//! - The transcript of displayed messages with loading placeholders
//! - The light/dark theme and its persisted preference
//! - Named UI events routed to handlers through an [`EventBus`]
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the [`ChatClient`] and its shared session state
//! - [`pipeline`]: query submission
//! - [`transcript`]: message nodes and placeholders
//! - [`theme`]: theme state and preference stores
//! - [`events`]: UI events and handler registration
//! - [`commands`]: slash command parsing for the terminal

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::client::CourseApi;

pub mod commands;
pub mod config;
pub mod events;
pub mod gate;
pub mod pipeline;
pub mod session;
pub mod theme;
pub mod transcript;
pub mod views;

#[cfg(test)]
mod testing;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use events::{Dispatch, EventBus, EventKind, Key, KeyResponse, UiEvent};
pub use gate::{InputGate, InputGuard};
pub use pipeline::SendOutcome;
pub use session::ChatClient;
pub use theme::{FileStore, MemoryStore, PreferenceStore, THEME_KEY, Theme, ThemeController};
pub use transcript::{LoadingHandle, MessageId, MessageNode, NodeBody, Transcript};
pub use views::{ChatModal, CourseStatsView, CourseTitles, HistoryView};

/// An [`EventBus`] with the client's handler registered for every named event.
pub fn default_event_bus<A, S>() -> EventBus<ChatClient<A, S>>
where
    A: CourseApi + 'static,
    S: PreferenceStore + 'static,
{
    let mut bus: EventBus<ChatClient<A, S>> = EventBus::new();
    bus.register(EventKind::SubmitQuery, on_submit_query::<A, S>)
        .register(EventKind::ToggleTheme, on_toggle_theme::<A, S>)
        .register(EventKind::SelectHistoryItem, on_select_history_item::<A, S>)
        .register(EventKind::CloseModal, on_close_modal::<A, S>)
        .register(EventKind::NewChat, on_new_chat::<A, S>);
    bus
}

fn on_submit_query<'a, A, S>(client: &'a ChatClient<A, S>, event: UiEvent) -> BoxFuture<'a, ()>
where
    A: CourseApi + 'static,
    S: PreferenceStore + 'static,
{
    async move {
        if let UiEvent::SubmitQuery(query) = event {
            let outcome = client.send_message(&query).await;
            tracing::debug!(?outcome, "query handled");
        }
    }
    .boxed()
}

fn on_toggle_theme<'a, A, S>(client: &'a ChatClient<A, S>, _: UiEvent) -> BoxFuture<'a, ()>
where
    A: CourseApi + 'static,
    S: PreferenceStore + 'static,
{
    async move {
        client.theme().toggle_theme();
        client.notify_changed();
    }
    .boxed()
}

fn on_select_history_item<'a, A, S>(
    client: &'a ChatClient<A, S>,
    event: UiEvent,
) -> BoxFuture<'a, ()>
where
    A: CourseApi + 'static,
    S: PreferenceStore + 'static,
{
    async move {
        if let UiEvent::SelectHistoryItem(session_id) = event {
            client.load_chat_read_only(&session_id).await;
        }
    }
    .boxed()
}

fn on_close_modal<'a, A, S>(client: &'a ChatClient<A, S>, _: UiEvent) -> BoxFuture<'a, ()>
where
    A: CourseApi + 'static,
    S: PreferenceStore + 'static,
{
    async move { client.close_modal() }.boxed()
}

fn on_new_chat<'a, A, S>(client: &'a ChatClient<A, S>, _: UiEvent) -> BoxFuture<'a, ()>
where
    A: CourseApi + 'static,
    S: PreferenceStore + 'static,
{
    client.create_new_session().boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::testing::FakeApi;
    use crate::types::{ChatSummary, ChatTranscript, Message, QueryResponse, Role};

    type Client = ChatClient<Arc<FakeApi>, MemoryStore>;

    #[test]
    fn every_event_has_a_handler() {
        let bus = default_event_bus::<Arc<FakeApi>, MemoryStore>();
        for kind in [
            EventKind::SubmitQuery,
            EventKind::ToggleTheme,
            EventKind::SelectHistoryItem,
            EventKind::CloseModal,
            EventKind::NewChat,
        ] {
            assert_eq!(bus.handler_count(kind), 1, "{kind}");
        }
    }

    #[tokio::test]
    async fn events_drive_the_client() {
        let api = Arc::new(FakeApi::new());
        api.push_query_result(Ok(QueryResponse {
            answer: "Lesson 2 covers embeddings.".to_string(),
            sources: Vec::new(),
            session_id: "session_1".to_string(),
        }));
        api.set_history(Ok(vec![ChatSummary::new("session_1", "Lesson 2?")]));
        api.set_transcript(Ok(ChatTranscript {
            session_id: Some("session_1".to_string()),
            messages: vec![Message::user("Lesson 2?")],
        }));
        let client: Client = ChatClient::new(Arc::clone(&api), MemoryStore::new());
        let bus = default_event_bus::<Arc<FakeApi>, MemoryStore>();

        bus.dispatch(&client, UiEvent::NewChat).await;
        assert_eq!(client.transcript().len(), 1);

        bus.dispatch(&client, UiEvent::SubmitQuery("Lesson 2?".to_string()))
            .await;
        assert_eq!(client.transcript().count_role(Role::User), 1);
        assert_eq!(client.session_id().as_deref(), Some("session_1"));

        bus.dispatch(&client, UiEvent::SelectHistoryItem("session_1".to_string()))
            .await;
        assert!(client.modal().is_some());
        bus.dispatch(&client, UiEvent::CloseModal).await;
        assert!(client.modal().is_none());

        assert_eq!(client.theme().current(), Theme::Dark);
        let dispatch = bus.dispatch(&client, UiEvent::ThemeKey(Key::Space)).await;
        assert!(dispatch.prevent_default);
        assert_eq!(client.theme().current(), Theme::Light);
        bus.dispatch(&client, UiEvent::ToggleTheme).await;
        assert_eq!(client.theme().current(), Theme::Dark);
        assert_eq!(
            client.theme().store().load(THEME_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }
}
