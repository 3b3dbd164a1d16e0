//! HTTP client for the remote quote collection.
//!
//! The collection is a JSONPlaceholder-style `/posts` resource: `GET` lists
//! posts (bounded by `_limit`), `POST` creates one and returns its id.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;

use quotesync_core::sync::RemoteTransport;
use quotesync_core::{QuoteRecord, Result as CoreResult};

use crate::error::{RemoteError, Result};
use crate::types::{CreatePostRequest, CreatePostResponse, RemotePost};

/// Mock collection used when no server is configured.
pub const DEFAULT_SERVER_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the remote posts collection.
#[derive(Debug, Clone)]
pub struct QuoteApiClient {
    client: reqwest::Client,
    collection_url: String,
}

impl QuoteApiClient {
    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Create a client for the collection at `collection_url`
    /// (e.g. "https://jsonplaceholder.typicode.com/posts").
    pub fn new(collection_url: &str) -> Result<Self> {
        Self::with_timeout(collection_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(collection_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(Self::headers())
            .build()?;

        Ok(Self {
            client,
            collection_url: collection_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
            if preview.is_empty() {
                preview = status.canonical_reason().unwrap_or("no body").to_string();
            }
            return Err(RemoteError::api(
                status.as_u16(),
                format!("Request failed: {}", preview),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to deserialize response. Error: {}", e);
            RemoteError::from(e)
        })
    }

    /// List posts.
    ///
    /// GET {collection}?_limit={limit}
    pub async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<RemotePost>> {
        let mut request = self.client.get(&self.collection_url);
        if let Some(limit) = limit {
            request = request.query(&[("_limit", limit)]);
        }
        debug!("[Remote] list_posts URL: {} limit={:?}", self.collection_url, limit);

        let response = request.send().await?;
        let mut posts: Vec<RemotePost> = Self::parse_response(response).await?;
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    /// Create a post.
    ///
    /// POST {collection}
    pub async fn create_post(&self, request: &CreatePostRequest) -> Result<CreatePostResponse> {
        debug!("[Remote] create_post: {:?}", request);

        let response = self
            .client
            .post(&self.collection_url)
            .json(request)
            .send()
            .await?;

        let created: CreatePostResponse = Self::parse_response(response).await?;
        if created.id.to_string().trim().is_empty() {
            return Err(RemoteError::invalid_response("Created post has an empty id"));
        }
        Ok(created)
    }
}

#[async_trait]
impl RemoteTransport for QuoteApiClient {
    async fn fetch_quotes(&self, limit: Option<usize>) -> CoreResult<Vec<QuoteRecord>> {
        let posts = self.list_posts(limit).await?;
        Ok(posts.into_iter().map(RemotePost::into_record).collect())
    }

    async fn push_quote(&self, record: &QuoteRecord) -> CoreResult<String> {
        let created = self
            .create_post(&CreatePostRequest::from_record(record))
            .await?;
        Ok(created.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotesync_core::{QuoteError, QuoteId};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        request_line: String,
        headers: HashMap<String, String>,
        body: String,
    }

    #[derive(Debug, Clone)]
    struct MockResponse {
        status: u16,
        body: String,
    }

    fn respond(status: u16, body: &str) -> MockResponse {
        MockResponse {
            status,
            body: body.to_string(),
        }
    }

    /// Read one request: request line, headers, then `content-length` bytes of body.
    async fn read_http_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await.ok()? == 0 {
            return None;
        }

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.ok()? == 0 {
                return None;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0_u8; content_length];
        reader.read_exact(&mut body).await.ok()?;

        Some(CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn write_http_response(
        stream: &mut TcpStream,
        response: &MockResponse,
    ) -> std::io::Result<()> {
        let reason = reqwest::StatusCode::from_u16(response.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown");
        let raw = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response.status,
            reason,
            response.body.len(),
            response.body
        );
        stream.write_all(raw.as_bytes()).await?;
        stream.flush().await
    }

    /// Serve `responses` in order, one connection at a time.
    async fn start_mock_server(
        responses: Vec<MockResponse>,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let url = format!("http://{}/posts", listener.local_addr().expect("listener addr"));
        let captured = Arc::new(TokioMutex::new(Vec::new()));

        let log = Arc::clone(&captured);
        let mut script = VecDeque::from(responses);
        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let Some(request) = read_http_request(&mut stream).await else {
                    continue;
                };
                log.lock().await.push(request);
                let response = script
                    .pop_front()
                    .unwrap_or_else(|| respond(500, r#"{"error":"unexpected request"}"#));
                let _ = write_http_response(&mut stream, &response).await;
            }
        });

        (url, captured, handle)
    }

    #[tokio::test]
    async fn fetch_sends_limit_and_maps_posts_into_remote_namespace() {
        let (url, captured, server) = start_mock_server(vec![respond(
            200,
            r#"[
                {"userId":1,"id":1,"title":"first title that is long","body":"first body"},
                {"userId":1,"id":2,"title":"second","body":""},
                {"userId":1,"id":3,"title":"third","body":"third body"}
            ]"#,
        )])
        .await;

        let client = QuoteApiClient::new(&url).unwrap();
        let records = client.fetch_quotes(Some(2)).await.expect("fetch ok");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, QuoteId::remote("1"));
        assert_eq!(records[0].text, "first body");
        assert_eq!(records[0].category, "first title that is ");
        assert_eq!(records[1].text, "second");

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].request_line.starts_with("GET /posts?_limit=2 "));

        server.abort();
    }

    #[tokio::test]
    async fn push_posts_payload_and_returns_assigned_id() {
        let (url, captured, server) =
            start_mock_server(vec![respond(201, r#"{"id":101,"title":"x","body":"y"}"#)]).await;

        let client = QuoteApiClient::new(&url).unwrap();
        let record = QuoteRecord::new_local("Stay curious.", "Wisdom");
        let remote_id = client.push_quote(&record).await.expect("push ok");
        assert_eq!(remote_id, "101");

        let requests = captured.lock().await.clone();
        assert!(requests[0].request_line.starts_with("POST /posts "));
        assert_eq!(
            requests[0].headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        let payload: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"title": "Wisdom", "body": "Stay curious.", "userId": 1})
        );

        server.abort();
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() {
        let (url, _captured, server) = start_mock_server(vec![
            respond(500, r#"{"error":"down"}"#),
            respond(404, "{}"),
        ])
        .await;

        let client = QuoteApiClient::new(&url).unwrap();
        let err = client.list_posts(Some(20)).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));

        let err: QuoteError = client.list_posts(None).await.unwrap_err().into();
        assert!(!err.is_retryable());

        server.abort();
    }

    #[tokio::test]
    async fn unparseable_body_is_a_permanent_error() {
        let (url, _captured, server) = start_mock_server(vec![respond(200, r#"{"not":"a list"}"#)]).await;

        let client = QuoteApiClient::new(&url).unwrap();
        let err = client.fetch_quotes(Some(5)).await.unwrap_err();
        assert!(matches!(err, QuoteError::Transport { retryable: false, .. }));

        server.abort();
    }

    #[tokio::test]
    async fn unreachable_server_is_retryable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            QuoteApiClient::with_timeout(&format!("http://{}/posts", addr), Duration::from_secs(2))
                .unwrap();
        let err = client.list_posts(Some(1)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
        assert_eq!(err.retry_class(), crate::error::ApiRetryClass::Retryable);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_collection_url() {
        let client = QuoteApiClient::new("https://example.test/posts/").unwrap();
        assert_eq!(client.collection_url(), "https://example.test/posts");
    }
}
