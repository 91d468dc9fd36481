//! The request pipeline: one user query at a time.

use crate::chat::session::ChatClient;
use crate::chat::theme::PreferenceStore;
use crate::chat::transcript::{LoadingHandle, MessageId};
use crate::client::CourseApi;
use crate::observability::{
    CHAT_QUERIES, CHAT_QUERIES_CANCELLED, CHAT_QUERIES_REJECTED, CHAT_QUERY_ERRORS,
};
use crate::types::{Message, QueryRequest};

/// What happened to a submitted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The query was empty after trimming; nothing happened.
    Ignored,
    /// Another query is still outstanding; the input is disabled.
    Busy,
    /// The answer was appended as this node.
    Answered(MessageId),
    /// The request failed; the error message was appended as this node.
    Failed(MessageId),
    /// The transcript was replaced while the request was outstanding, so the
    /// result was dropped.
    Discarded,
}

impl<A: CourseApi, S: PreferenceStore> ChatClient<A, S> {
    /// Sends one query to the API and displays the result.
    ///
    /// The user's text is echoed immediately, followed by a loading
    /// placeholder.  The placeholder is replaced by the answer, or by an
    /// assistant-styled error message when the request fails.  The input stays
    /// disabled until this returns, whatever the outcome.  Dropping the
    /// future early removes the placeholder and re-enables the input.
    pub async fn send_message(&self, query: &str) -> SendOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(_input) = self.input.try_disable() else {
            CHAT_QUERIES_REJECTED.click();
            return SendOutcome::Busy;
        };
        CHAT_QUERIES.click();

        let (request, pending) = {
            let mut context = self.context();
            context.transcript.add_message(Message::user(query), false);
            let loading = context.transcript.push_loading();
            (
                QueryRequest::new(query, context.session_id.clone()),
                PendingReply::new(self, loading),
            )
        };
        self.notify_changed();

        let result = self.api.query(&request).await;
        let Some(loading) = pending.disarm() else {
            return SendOutcome::Discarded;
        };

        let outcome = {
            let mut context = self.context();
            if !context.transcript.is_current(&loading) {
                tracing::debug!("transcript replaced while a query was outstanding");
                return SendOutcome::Discarded;
            }
            match result {
                Ok(response) => {
                    if context.session_id.is_none() {
                        tracing::debug!(session_id = %response.session_id, "adopting session");
                        context.session_id = Some(response.session_id);
                    }
                    let message = Message::assistant(response.answer, response.sources);
                    context
                        .transcript
                        .resolve_loading(loading, message)
                        .map_or(SendOutcome::Discarded, SendOutcome::Answered)
                }
                Err(err) => {
                    CHAT_QUERY_ERRORS.click();
                    tracing::warn!(error = %err, "query failed");
                    let message = Message::assistant(format!("Error: {err}"), Vec::new());
                    context
                        .transcript
                        .resolve_loading(loading, message)
                        .map_or(SendOutcome::Discarded, SendOutcome::Failed)
                }
            }
        };
        self.notify_changed();
        outcome
    }
}

/// Owns a loading placeholder while its query is outstanding.
///
/// If the query future is dropped before it completes, the placeholder is
/// removed so the transcript never keeps a stranded loading indicator.
struct PendingReply<'a, A: CourseApi, S: PreferenceStore> {
    client: &'a ChatClient<A, S>,
    loading: Option<LoadingHandle>,
}

impl<'a, A: CourseApi, S: PreferenceStore> PendingReply<'a, A, S> {
    fn new(client: &'a ChatClient<A, S>, loading: LoadingHandle) -> Self {
        Self {
            client,
            loading: Some(loading),
        }
    }

    /// Hands the placeholder back for resolution.
    fn disarm(mut self) -> Option<LoadingHandle> {
        self.loading.take()
    }
}

impl<A: CourseApi, S: PreferenceStore> Drop for PendingReply<'_, A, S> {
    fn drop(&mut self) {
        let Some(loading) = self.loading.take() else {
            return;
        };
        let removed = self.client.context().transcript.abandon_loading(loading);
        if removed {
            CHAT_QUERIES_CANCELLED.click();
            tracing::debug!("query cancelled, loading placeholder removed");
            self.client.notify_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::chat::testing::FakeApi;
    use crate::chat::theme::MemoryStore;
    use crate::error::Error;
    use crate::types::{QueryResponse, Role, Source};

    fn client(api: &Arc<FakeApi>) -> ChatClient<Arc<FakeApi>, MemoryStore> {
        ChatClient::new(Arc::clone(api), MemoryStore::new())
    }

    fn answer(text: &str, session_id: &str) -> QueryResponse {
        QueryResponse {
            answer: text.to_string(),
            sources: Vec::new(),
            session_id: session_id.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_query_is_a_no_op() {
        let api = Arc::new(FakeApi::new());
        let client = client(&api);
        client.create_new_session().await;
        let before = client.transcript();

        assert_eq!(client.send_message("").await, SendOutcome::Ignored);
        assert_eq!(client.send_message("   \n\t ").await, SendOutcome::Ignored);

        assert!(api.queries().is_empty());
        assert_eq!(client.transcript().nodes(), before.nodes());
        assert!(client.input_enabled());
    }

    #[tokio::test]
    async fn success_appends_user_and_assistant() {
        let api = Arc::new(FakeApi::new());
        api.push_query_result(Ok(QueryResponse {
            answer: "**RAG** combines retrieval and generation.".to_string(),
            sources: vec![Source::with_url("Lecture 1", "https://x")],
            session_id: "session_1".to_string(),
        }));
        let client = client(&api);

        let outcome = client.send_message("  What is RAG?  ").await;

        assert!(matches!(outcome, SendOutcome::Answered(_)));
        let transcript = client.transcript();
        assert_eq!(transcript.count_role(Role::User), 1);
        assert_eq!(transcript.count_role(Role::Assistant), 1);
        assert_eq!(transcript.loading_count(), 0);
        let messages: Vec<_> = transcript.messages().collect();
        assert_eq!(messages[0].content, "What is RAG?");
        assert_eq!(messages[1].sources.len(), 1);
        assert_eq!(api.queries()[0].query, "What is RAG?");
        assert!(client.input_enabled());
    }

    #[tokio::test]
    async fn first_session_id_is_adopted_for_later_queries() {
        let api = Arc::new(FakeApi::new());
        api.push_query_result(Ok(answer("one", "s1")));
        api.push_query_result(Ok(answer("two", "s1")));
        api.push_query_result(Ok(answer("three", "s-other")));
        let client = client(&api);

        client.send_message("first").await;
        client.send_message("second").await;
        client.send_message("third").await;

        let queries = api.queries();
        assert_eq!(queries[0].session_id, None);
        assert_eq!(queries[1].session_id.as_deref(), Some("s1"));
        assert_eq!(queries[2].session_id.as_deref(), Some("s1"));
        assert_eq!(client.session_id().as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn failure_is_shown_in_transcript() {
        let api = Arc::new(FakeApi::new());
        api.push_query_result(Err(Error::internal_server("Query failed")));
        let client = client(&api);

        let outcome = client.send_message("Why?").await;

        let SendOutcome::Failed(id) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        let transcript = client.transcript();
        assert_eq!(transcript.loading_count(), 0);
        assert_eq!(transcript.count_role(Role::User), 1);
        assert_eq!(transcript.count_role(Role::Assistant), 1);
        let node = transcript.nodes().iter().find(|n| n.id == id).unwrap();
        assert_eq!(
            node.message().unwrap().content,
            "Error: Internal server error: Query failed"
        );
        assert!(client.session_id().is_none());
        assert!(client.input_enabled());
    }

    #[tokio::test]
    async fn input_is_disabled_while_outstanding() {
        let api = Arc::new(FakeApi::new());
        let release = api.pause_next_query(Ok(answer("done", "s1")));
        let client = client(&api);

        let first = client.send_message("slow question");
        let second = async {
            tokio::task::yield_now().await;
            assert!(!client.input_enabled());
            let transcript = client.transcript();
            assert_eq!(transcript.loading_count(), 1);
            let outcome = client.send_message("impatient question").await;
            release.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, SendOutcome::Answered(_)));
        assert_eq!(second, SendOutcome::Busy);
        assert_eq!(api.queries().len(), 1);
        assert_eq!(client.transcript().count_role(Role::User), 1);
        assert!(client.input_enabled());
    }

    #[tokio::test]
    async fn result_for_replaced_transcript_is_discarded() {
        let api = Arc::new(FakeApi::new());
        let release = api.pause_next_query(Ok(answer("late", "s-late")));
        let client = client(&api);

        let query = client.send_message("question");
        let reset = async {
            tokio::task::yield_now().await;
            client.create_new_session().await;
            release.notify_one();
        };
        let (outcome, ()) = tokio::join!(query, reset);

        assert_eq!(outcome, SendOutcome::Discarded);
        let transcript = client.transcript();
        assert_eq!(transcript.len(), 1);
        assert!(transcript.nodes()[0].is_welcome());
        assert!(client.session_id().is_none());
        assert!(client.input_enabled());
    }

    #[tokio::test]
    async fn cancelled_query_removes_its_placeholder() {
        let api = Arc::new(FakeApi::new());
        let _release = api.pause_next_query(Ok(answer("never", "s1")));
        let client = client(&api);
        client.create_new_session().await;

        let result =
            tokio::time::timeout(Duration::from_millis(20), client.send_message("stuck")).await;

        assert!(result.is_err());
        let transcript = client.transcript();
        assert_eq!(transcript.loading_count(), 0);
        assert_eq!(transcript.count_role(Role::User), 1);
        assert!(client.input_enabled());
        assert!(client.session_id().is_none());
    }

    #[tokio::test]
    async fn each_query_adds_exactly_one_pair() {
        let api = Arc::new(FakeApi::new());
        api.push_query_result(Ok(answer("a", "s1")));
        api.push_query_result(Err(Error::connection("refused", None)));
        api.push_query_result(Ok(answer("c", "s1")));
        let client = client(&api);
        client.create_new_session().await;

        for (n, query) in ["one", "two", "three"].into_iter().enumerate() {
            client.send_message(query).await;
            let transcript = client.transcript();
            assert_eq!(transcript.count_role(Role::User), n + 1);
            // The welcome message is an assistant node too.
            assert_eq!(transcript.count_role(Role::Assistant), n + 2);
            assert_eq!(transcript.loading_count(), 0);
        }
    }
}
