//! Named UI events and explicit handler registration.
//!
//! A front end translates its input (key presses, clicks, REPL lines) into
//! [`UiEvent`]s and hands them to an [`EventBus`].  Handlers are registered
//! per [`EventKind`] and run in registration order.

use std::collections::HashMap;
use std::fmt;

use futures::future::BoxFuture;

/// A key delivered to a focused control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Enter/Return.
    Enter,
    /// The space bar.
    Space,
    /// Escape.
    Escape,
    /// Any other printable key.
    Char(char),
}

/// How a control consumed a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyResponse {
    /// The key activated the control.
    pub handled: bool,
    /// The host must suppress its default action (page scrolling for Space).
    pub prevent_default: bool,
}

impl KeyResponse {
    /// The response of a button-like toggle to `key`.
    pub fn for_toggle(key: Key) -> Self {
        match key {
            Key::Enter => KeyResponse {
                handled: true,
                prevent_default: false,
            },
            Key::Space => KeyResponse {
                handled: true,
                prevent_default: true,
            },
            _ => KeyResponse::default(),
        }
    }
}

/// The named events a front end can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The user submitted the query input.
    SubmitQuery,
    /// The user activated the theme toggle.
    ToggleTheme,
    /// The user picked an entry of the history list.
    SelectHistoryItem,
    /// The user dismissed the read-only chat view.
    CloseModal,
    /// The user asked for a fresh conversation.
    NewChat,
}

impl EventKind {
    /// The event's name.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SubmitQuery => "submit-query",
            EventKind::ToggleTheme => "toggle-theme",
            EventKind::SelectHistoryItem => "select-history-item",
            EventKind::CloseModal => "close-modal",
            EventKind::NewChat => "new-chat",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Query text as typed.
    SubmitQuery(String),
    /// Pointer activation of the theme toggle.
    ToggleTheme,
    /// Keyboard activation of the theme toggle.
    ThemeKey(Key),
    /// Session id of the chosen history entry.
    SelectHistoryItem(String),
    /// Close the read-only view.
    CloseModal,
    /// Start a new conversation.
    NewChat,
}

impl UiEvent {
    /// The named event this raises, if any.
    ///
    /// Keys that do not activate the toggle raise nothing.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            UiEvent::SubmitQuery(_) => Some(EventKind::SubmitQuery),
            UiEvent::ToggleTheme => Some(EventKind::ToggleTheme),
            UiEvent::ThemeKey(key) => {
                KeyResponse::for_toggle(*key)
                    .handled
                    .then_some(EventKind::ToggleTheme)
            }
            UiEvent::SelectHistoryItem(_) => Some(EventKind::SelectHistoryItem),
            UiEvent::CloseModal => Some(EventKind::CloseModal),
            UiEvent::NewChat => Some(EventKind::NewChat),
        }
    }

    /// The host's default action must be suppressed for this event.
    pub fn prevent_default(&self) -> bool {
        match self {
            UiEvent::ThemeKey(key) => KeyResponse::for_toggle(*key).prevent_default,
            _ => false,
        }
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Number of handlers that ran.
    pub handlers: usize,
    /// The host must suppress its default action.
    pub prevent_default: bool,
}

impl Dispatch {
    /// Returns true if at least one handler ran.
    pub fn handled(&self) -> bool {
        self.handlers > 0
    }
}

type Handler<C> = Box<dyn for<'a> Fn(&'a C, UiEvent) -> BoxFuture<'a, ()> + Send + Sync>;

/// Routes [`UiEvent`]s to the handlers registered for their kind.
pub struct EventBus<C> {
    handlers: HashMap<EventKind, Vec<Handler<C>>>,
}

impl<C: Sync + 'static> EventBus<C> {
    /// Creates a bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `kind`.
    pub fn register<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a C, UiEvent) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.handlers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Runs every handler registered for the event's kind, in order.
    pub async fn dispatch(&self, context: &C, event: UiEvent) -> Dispatch {
        let prevent_default = event.prevent_default();
        let Some(kind) = event.kind() else {
            return Dispatch::default();
        };
        let Some(handlers) = self.handlers.get(&kind) else {
            tracing::debug!(event = %kind, "no handler registered");
            return Dispatch {
                handlers: 0,
                prevent_default,
            };
        };
        for handler in handlers {
            handler(context, event.clone()).await;
        }
        Dispatch {
            handlers: handlers.len(),
            prevent_default,
        }
    }
}

impl<C: Sync + 'static> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}
