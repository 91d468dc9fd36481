//! Core chat client and session management.
//!
//! This module provides the [`ChatClient`], which holds the single
//! `SessionContext` for a client lifetime and implements the session
//! operations: starting a new session, loading course stats and the history
//! list, and opening a past chat read-only.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::chat::gate::InputGate;
use crate::chat::theme::{PreferenceStore, ThemeController};
use crate::chat::transcript::Transcript;
use crate::chat::views::{ChatModal, CourseStatsView, HistoryView, WELCOME_MESSAGE};
use crate::client::CourseApi;
use crate::observability::{CHAT_NEW_SESSIONS, CHAT_STALE_RESPONSES};
use crate::types::Message;

/// All mutable state of one client: the session id and every display region.
#[derive(Debug, Default)]
pub(crate) struct SessionContext {
    pub(crate) session_id: Option<String>,
    pub(crate) transcript: Transcript,
    pub(crate) history: HistoryView,
    pub(crate) course_stats: CourseStatsView,
    pub(crate) modal: Option<ChatModal>,
    pub(crate) alerts: VecDeque<String>,
    history_ticket: u64,
    stats_ticket: u64,
    modal_ticket: u64,
}

/// Which overlapping read a ticket belongs to.
#[derive(Debug, Clone, Copy)]
enum Region {
    History,
    Stats,
    Modal,
}

/// The chat client: session manager, request pipeline, and theme controller
/// over one `SessionContext`.
///
/// Every operation takes `&self` and catches its own failures, turning them
/// into display state.  The context lock is never held across an `.await`.
pub struct ChatClient<A: CourseApi, S: PreferenceStore> {
    pub(crate) api: A,
    context: Mutex<SessionContext>,
    pub(crate) input: InputGate,
    theme: ThemeController<S>,
    changed: Notify,
}

impl<A: CourseApi, S: PreferenceStore> ChatClient<A, S> {
    /// Creates a client with an empty transcript and no session.
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            context: Mutex::new(SessionContext::default()),
            input: InputGate::new(),
            theme: ThemeController::new(store),
            changed: Notify::new(),
        }
    }

    /// Starts a fresh conversation.
    ///
    /// Forgets the current session id (the server keeps its data), replaces
    /// the transcript with the welcome message, closes any read-only view,
    /// and refreshes the history list.
    pub async fn create_new_session(&self) {
        CHAT_NEW_SESSIONS.click();
        {
            let mut context = self.context();
            context.session_id = None;
            context.transcript.clear();
            context
                .transcript
                .add_message(Message::assistant(WELCOME_MESSAGE, Vec::new()), true);
            context.modal = None;
        }
        self.notify_changed();
        self.load_chat_history().await;
    }

    /// Loads the course count and titles.
    ///
    /// Any failure shows a zero count and the error placeholder.
    pub async fn load_course_stats(&self) {
        let ticket = self.issue_ticket(Region::Stats);
        let view = match self.api.course_stats().await {
            Ok(stats) => CourseStatsView::loaded(stats),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load course stats");
                CourseStatsView::failed()
            }
        };
        {
            let mut context = self.context();
            if !Self::is_latest(&context, Region::Stats, ticket) {
                return;
            }
            context.course_stats = view;
        }
        self.notify_changed();
    }

    /// Loads the list of past chats.
    ///
    /// An empty list shows the "no chats" placeholder; a failure shows the
    /// error placeholder.  There is no retry.
    pub async fn load_chat_history(&self) {
        let ticket = self.issue_ticket(Region::History);
        let view = match self.api.chat_history().await {
            Ok(summaries) => HistoryView::from_summaries(summaries),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load chat history");
                HistoryView::Error
            }
        };
        {
            let mut context = self.context();
            if !Self::is_latest(&context, Region::History, ticket) {
                return;
            }
            context.history = view;
        }
        self.notify_changed();
    }

    /// Opens a past chat in the read-only view.
    ///
    /// On failure no view opens; a blocking alert naming the error is queued
    /// instead.  Returns true if the view opened.
    pub async fn load_chat_read_only(&self, session_id: &str) -> bool {
        let ticket = self.issue_ticket(Region::Modal);
        let result = self.api.chat_transcript(session_id).await;
        let opened = {
            let mut context = self.context();
            if !Self::is_latest(&context, Region::Modal, ticket) {
                return false;
            }
            match result {
                Ok(transcript) => {
                    let title = context
                        .history
                        .items()
                        .iter()
                        .find(|item| item.session_id == session_id)
                        .map(|item| item.title.clone());
                    context.modal = Some(ChatModal {
                        session_id: session_id.to_string(),
                        title,
                        messages: transcript.messages,
                    });
                    true
                }
                Err(err) => {
                    tracing::warn!(error = %err, session_id, "failed to load chat");
                    context.alerts.push_back(format!("Failed to load chat: {err}"));
                    false
                }
            }
        };
        self.notify_changed();
        opened
    }

    /// Closes the read-only view.
    pub fn close_modal(&self) {
        let closed = self.context().modal.take().is_some();
        if closed {
            self.notify_changed();
        }
    }

    /// Removes and returns the oldest unacknowledged alert.
    pub fn take_alert(&self) -> Option<String> {
        self.context().alerts.pop_front()
    }

    /// The session id of the `index`th history entry (zero-based).
    pub fn history_session(&self, index: usize) -> Option<String> {
        self.context()
            .history
            .items()
            .get(index)
            .map(|item| item.session_id.clone())
    }

    /// The current session id.
    pub fn session_id(&self) -> Option<String> {
        self.context().session_id.clone()
    }

    /// A copy of the active transcript.
    pub fn transcript(&self) -> Transcript {
        self.context().transcript.clone()
    }

    /// A copy of the history list region.
    pub fn history(&self) -> HistoryView {
        self.context().history.clone()
    }

    /// A copy of the course stats region.
    pub fn course_stats(&self) -> CourseStatsView {
        self.context().course_stats.clone()
    }

    /// A copy of the read-only view, if open.
    pub fn modal(&self) -> Option<ChatModal> {
        self.context().modal.clone()
    }

    /// Returns true if the user can currently submit a query.
    pub fn input_enabled(&self) -> bool {
        self.input.is_enabled()
    }

    /// The theme controller.
    pub fn theme(&self) -> &ThemeController<S> {
        &self.theme
    }

    /// The API the client talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolves after the next change to the display state.
    ///
    /// A change that happens while nobody is waiting is remembered, so a
    /// render loop never misses an update.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    pub(crate) fn notify_changed(&self) {
        self.changed.notify_one();
    }

    pub(crate) fn context(&self) -> MutexGuard<'_, SessionContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_ticket(&self, region: Region) -> u64 {
        let mut context = self.context();
        let ticket = match region {
            Region::History => &mut context.history_ticket,
            Region::Stats => &mut context.stats_ticket,
            Region::Modal => &mut context.modal_ticket,
        };
        *ticket += 1;
        *ticket
    }

    /// The most recently issued request for a region wins; older responses
    /// are dropped.
    fn is_latest(context: &SessionContext, region: Region, ticket: u64) -> bool {
        let latest = match region {
            Region::History => context.history_ticket,
            Region::Stats => context.stats_ticket,
            Region::Modal => context.modal_ticket,
        };
        if ticket != latest {
            CHAT_STALE_RESPONSES.click();
            tracing::debug!(?region, ticket, latest, "dropping stale response");
            return false;
        }
        true
    }
}
