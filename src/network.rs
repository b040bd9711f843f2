use crate::config::Config;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

/// Anything that can fetch a URL's body as text.
///
/// The resolver and fetch queue talk to the network through this trait so
/// tests can substitute a canned fetcher.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP client for fetching sitemap and page content
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout_duration: Duration,
    max_content_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with settings tuned for polite scanning.
    ///
    /// Sends a realistic browser-like User-Agent; plenty of shops block
    /// anything that self-identifies as a bot.
    pub fn new(user_agent: &str, timeout_secs: u64) -> Self {
        Self::with_content_limit(user_agent, timeout_secs, Config::MAX_CONTENT_SIZE)
    }

    /// Create a new HTTP client with a custom content size limit
    pub fn with_content_limit(
        user_agent: &str,
        timeout_secs: u64,
        max_content_size: usize,
    ) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/xml,application/xml,application/xhtml+xml,text/html;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(Config::CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_duration: Duration::from_secs(timeout_secs),
            max_content_size,
        }
    }

    /// Fetch a URL once and return the body as text.
    ///
    /// Retries live in the fetch queue, not here; a single attempt either
    /// succeeds within the timeout or returns a classified error.
    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = timeout(self.timeout_duration, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(Self::classify_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_content_size {
                return Err(FetchError::ContentTooLarge(
                    length as usize,
                    self.max_content_size,
                ));
            }
        }

        let content = timeout(self.timeout_duration, response.text())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::Body(e.to_string()))?;

        if content.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(
                content.len(),
                self.max_content_size,
            ));
        }

        Ok(content)
    }

    /// Classify reqwest errors into our FetchError kinds
    fn classify_error(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout;
        }

        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("connection refused") {
            return FetchError::ConnectionRefused;
        }

        if error_msg.contains("dns") || error_msg.contains("name resolution") {
            return FetchError::Dns;
        }

        FetchError::Network(error.to_string())
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_once(url).await
    }
}

/// Errors that can occur during HTTP fetching
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("request timeout")]
    Timeout,

    #[error("HTTP error status {0}")]
    Status(u16),

    #[error("connection refused")]
    ConnectionRefused,

    #[error("DNS resolution failed")]
    Dns,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("content too large: {0} bytes (max: {1} bytes)")]
    ContentTooLarge(usize, usize),
}

impl FetchError {
    /// Check if this error is retryable (transient) or permanent
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RateLimited => true,
            FetchError::Timeout => true,
            // Server-side trouble and request timeouts tend to clear up
            FetchError::Status(code) => *code >= 500 || *code == 408,
            FetchError::Network(_) => true,
            FetchError::ConnectionRefused => false,
            FetchError::Dns => false,
            FetchError::Body(_) => false,
            FetchError::ContentTooLarge(_, _) => false,
        }
    }
}
