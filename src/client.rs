use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{ChatSummary, ChatTranscript, CourseStats, QueryRequest, QueryResponse};

/// Base URL used when neither an option nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/";

/// Environment variable that overrides [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "COURSE_CHAT_API_URL";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The operations the chat client needs from the course-materials API.
///
/// [`CourseClient`] is the HTTP implementation.  Anything else implementing
/// this trait (an in-process fake, a caching layer) can be handed to
/// [`ChatClient`](crate::chat::ChatClient) instead.
#[async_trait::async_trait]
pub trait CourseApi: Send + Sync {
    /// `POST /query`
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;

    /// `GET /courses`
    async fn course_stats(&self) -> Result<CourseStats>;

    /// `GET /chat-history`
    async fn chat_history(&self) -> Result<Vec<ChatSummary>>;

    /// `GET /chat/{session_id}`
    async fn chat_transcript(&self, session_id: &str) -> Result<ChatTranscript>;
}

#[async_trait::async_trait]
impl<T: CourseApi + ?Sized> CourseApi for Arc<T> {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        (**self).query(request).await
    }

    async fn course_stats(&self) -> Result<CourseStats> {
        (**self).course_stats().await
    }

    async fn chat_history(&self) -> Result<Vec<ChatSummary>> {
        (**self).chat_history().await
    }

    async fn chat_transcript(&self, session_id: &str) -> Result<ChatTranscript> {
        (**self).chat_transcript(session_id).await
    }
}

/// HTTP client for the course-materials API.
#[derive(Debug, Clone)]
pub struct CourseClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl CourseClient {
    /// Create a new client.
    ///
    /// The base URL is read from the COURSE_CHAT_API_URL environment variable,
    /// falling back to [`DEFAULT_API_URL`].
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve an endpoint below the base URL.
    ///
    /// Each segment is percent-encoded, so session identifiers can never
    /// escape their path position.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("base URL cannot hold a path", None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        // FastAPI reports failures as {"detail": "..."}
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(error_body);

        match status_code {
            400 => Error::bad_request(error_message),
            404 => Error::not_found(error_message, None),
            408 => Error::timeout(error_message, None),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message),
            _ => Error::api(status_code, error_message),
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.execute_inner(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }

    async fn execute_inner<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl CourseApi for CourseClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let url = self.endpoint(&["query"])?;
        tracing::debug!(%url, has_session = request.session_id.is_some(), "sending query");
        self.execute(self.client.post(url).json(request)).await
    }

    async fn course_stats(&self) -> Result<CourseStats> {
        let url = self.endpoint(&["courses"])?;
        tracing::debug!(%url, "loading course stats");
        self.execute(self.client.get(url)).await
    }

    async fn chat_history(&self) -> Result<Vec<ChatSummary>> {
        let url = self.endpoint(&["chat-history"])?;
        tracing::debug!(%url, "loading chat history");
        self.execute(self.client.get(url)).await
    }

    async fn chat_transcript(&self, session_id: &str) -> Result<ChatTranscript> {
        if session_id.is_empty() {
            return Err(Error::validation(
                "session id must not be empty",
                Some("session_id".to_string()),
            ));
        }
        let url = self.endpoint(&["chat", session_id])?;
        tracing::debug!(%url, "loading chat transcript");
        self.execute(self.client.get(url)).await
    }
}

/// Parse a base URL, making sure it ends in a slash so endpoints nest below it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as a base URL"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CourseClient::with_options(
            Some("https://courses.example.com/api".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://courses.example.com/api/");
        assert_eq!(client.timeout(), Duration::from_secs(30));

        let client =
            CourseClient::with_options(Some(DEFAULT_API_URL.to_string()), None).unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn endpoints_nest_below_base() {
        let client =
            CourseClient::with_options(Some("http://localhost:8000/api/".to_string()), None)
                .unwrap();
        assert_eq!(
            client.endpoint(&["query"]).unwrap().as_str(),
            "http://localhost:8000/api/query"
        );
        assert_eq!(
            client.endpoint(&["chat-history"]).unwrap().as_str(),
            "http://localhost:8000/api/chat-history"
        );
        assert_eq!(
            client.endpoint(&["chat", "session_1"]).unwrap().as_str(),
            "http://localhost:8000/api/chat/session_1"
        );
    }

    #[test]
    fn session_ids_are_percent_encoded() {
        let client =
            CourseClient::with_options(Some("http://localhost:8000/api".to_string()), None)
                .unwrap();
        let url = client.endpoint(&["chat", "../admin?x=1"]).unwrap();
        assert_eq!(url.path(), "/api/chat/..%2Fadmin%3Fx=1");
        assert!(url.query().is_none());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = CourseClient::with_options(Some("not a url".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));

        let err =
            CourseClient::with_options(Some("mailto:someone@example.com".to_string()), None)
                .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = CourseClient::with_options(
            Some("http://127.0.0.1:9/api/".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        let err = client.course_stats().await.unwrap_err();
        assert!(err.is_connection() || err.is_timeout() || matches!(err, Error::HttpClient { .. }));
    }
}
