use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("course_chat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("course_chat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("course_chat.client.request_duration_seconds");

pub(crate) static CHAT_QUERIES: Counter = Counter::new("course_chat.chat.queries");
pub(crate) static CHAT_QUERY_ERRORS: Counter = Counter::new("course_chat.chat.query_errors");
pub(crate) static CHAT_QUERIES_REJECTED: Counter =
    Counter::new("course_chat.chat.queries_rejected");
pub(crate) static CHAT_QUERIES_CANCELLED: Counter =
    Counter::new("course_chat.chat.queries_cancelled");
pub(crate) static CHAT_STALE_RESPONSES: Counter =
    Counter::new("course_chat.chat.stale_responses");
pub(crate) static CHAT_NEW_SESSIONS: Counter = Counter::new("course_chat.chat.new_sessions");

pub(crate) static THEME_TOGGLES: Counter = Counter::new("course_chat.theme.toggles");
pub(crate) static THEME_STORE_ERRORS: Counter = Counter::new("course_chat.theme.store_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_QUERIES);
    collector.register_counter(&CHAT_QUERY_ERRORS);
    collector.register_counter(&CHAT_QUERIES_REJECTED);
    collector.register_counter(&CHAT_QUERIES_CANCELLED);
    collector.register_counter(&CHAT_STALE_RESPONSES);
    collector.register_counter(&CHAT_NEW_SESSIONS);

    collector.register_counter(&THEME_TOGGLES);
    collector.register_counter(&THEME_STORE_ERRORS);
}
