//! Thin HTTP layer shared by the non-browser adapters.
//!
//! Not a browser — plain requests with an explicit timeout per call and a
//! desktop user-agent (the provider serves some endpoints differently to
//! obvious bots). A separate constructor hands out a cookie-jar client for
//! the legacy session bootstrap; that client is created inside one adapter
//! call and dropped with it, so no session state survives a cycle.

use crate::errors::SourceError;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36";

/// Response reduced to what the decoders need.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for one acquisition channel.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Stateless client with a per-request timeout.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: builder(timeout_ms).build().unwrap_or_default(),
        }
    }

    /// Client with an in-memory cookie jar, for session-bootstrap flows.
    /// Scope it to a single adapter call.
    pub fn with_cookie_jar(timeout_ms: u64) -> Self {
        Self {
            client: builder(timeout_ms).cookie_store(true).build().unwrap_or_default(),
        }
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let resp = self.client.get(url).send().await?;
        read(resp).await
    }

    /// POST a JSON payload.
    pub async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<HttpResponse, SourceError> {
        let resp = self.client.post(url).json(payload).send().await?;
        read(resp).await
    }

    /// POST with an empty body. The legacy service rejects anything else.
    pub async fn post_empty(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("")
            .send()
            .await?;
        read(resp).await
    }
}

fn builder(timeout_ms: u64) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(USER_AGENT)
}

async fn read(resp: reqwest::Response) -> Result<HttpResponse, SourceError> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok(HttpResponse { status, body })
}

/// Heuristic for an HTML-shaped body where JSON was expected. The provider's
/// access block answers 200 with an interstitial page, so status alone does
/// not tell rejection apart from data.
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(256)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<head")
}
