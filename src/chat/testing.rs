//! In-process [`CourseApi`] used by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::client::CourseApi;
use crate::error::{Error, Result};
use crate::types::{ChatSummary, ChatTranscript, CourseStats, QueryRequest, QueryResponse};

struct Paused<T> {
    release: Arc<Notify>,
    result: Result<T>,
}

/// Canned responses plus a record of every request.
pub(crate) struct FakeApi {
    queries: Mutex<Vec<QueryRequest>>,
    query_results: Mutex<VecDeque<Result<QueryResponse>>>,
    paused_query: Mutex<Option<Paused<QueryResponse>>>,
    stats: Mutex<Result<CourseStats>>,
    history: Mutex<Result<Vec<ChatSummary>>>,
    paused_history: Mutex<Option<Paused<Vec<ChatSummary>>>>,
    history_calls: Mutex<usize>,
    transcript: Mutex<Result<ChatTranscript>>,
    transcript_requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            query_results: Mutex::new(VecDeque::new()),
            paused_query: Mutex::new(None),
            stats: Mutex::new(Ok(CourseStats::default())),
            history: Mutex::new(Ok(Vec::new())),
            paused_history: Mutex::new(None),
            history_calls: Mutex::new(0),
            transcript: Mutex::new(Err(Error::not_found("Chat not found", None))),
            transcript_requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues the result of the next query.  Unqueued queries fail.
    pub(crate) fn push_query_result(&self, result: Result<QueryResponse>) {
        self.query_results.lock().unwrap().push_back(result);
    }

    /// The next query waits for the returned notify before answering.
    pub(crate) fn pause_next_query(&self, result: Result<QueryResponse>) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.paused_query.lock().unwrap() = Some(Paused {
            release: Arc::clone(&release),
            result,
        });
        release
    }

    pub(crate) fn queries(&self) -> Vec<QueryRequest> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn set_stats(&self, result: Result<CourseStats>) {
        *self.stats.lock().unwrap() = result;
    }

    pub(crate) fn set_history(&self, result: Result<Vec<ChatSummary>>) {
        *self.history.lock().unwrap() = result;
    }

    /// The next history load waits for the returned notify before answering.
    pub(crate) fn pause_next_history(&self, result: Result<Vec<ChatSummary>>) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.paused_history.lock().unwrap() = Some(Paused {
            release: Arc::clone(&release),
            result,
        });
        release
    }

    pub(crate) fn history_calls(&self) -> usize {
        *self.history_calls.lock().unwrap()
    }

    pub(crate) fn set_transcript(&self, result: Result<ChatTranscript>) {
        *self.transcript.lock().unwrap() = result;
    }

    pub(crate) fn transcript_requests(&self) -> Vec<String> {
        self.transcript_requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CourseApi for FakeApi {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.queries.lock().unwrap().push(request.clone());
        let paused = self.paused_query.lock().unwrap().take();
        if let Some(paused) = paused {
            paused.release.notified().await;
            return paused.result;
        }
        self.query_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::internal_server("no canned answer")))
    }

    async fn course_stats(&self) -> Result<CourseStats> {
        self.stats.lock().unwrap().clone()
    }

    async fn chat_history(&self) -> Result<Vec<ChatSummary>> {
        *self.history_calls.lock().unwrap() += 1;
        let paused = self.paused_history.lock().unwrap().take();
        if let Some(paused) = paused {
            paused.release.notified().await;
            return paused.result;
        }
        self.history.lock().unwrap().clone()
    }

    async fn chat_transcript(&self, session_id: &str) -> Result<ChatTranscript> {
        self.transcript_requests
            .lock()
            .unwrap()
            .push(session_id.to_string());
        self.transcript.lock().unwrap().clone()
    }
}
