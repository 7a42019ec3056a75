//! Page fetcher for feature extraction.
//!
//! Issues a single bounded GET and follows redirects manually so the hop
//! history is observable (the Redirect feature counts hops). Every network
//! or protocol failure is absorbed into an empty capture; extraction must
//! never fail because the target was unreachable.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("Redirect response without a Location header")]
    MissingLocation,
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// What came back from fetching a URL, reduced to what the extractors need.
///
/// On any fetch failure this is `PageCapture::empty()`: no status, no hops,
/// empty body. Downstream heuristics treat that as their neutral input.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    /// URL the final (non-redirect) response came from.
    pub final_url: Option<String>,
    /// Status of the final response.
    pub status: Option<u16>,
    /// Number of redirect hops followed before the final response.
    pub redirect_count: usize,
    /// Raw body text of the final response.
    pub body: String,
}

impl PageCapture {
    pub fn empty() -> Self {
        PageCapture::default()
    }

    pub fn has_response(&self) -> bool {
        self.status.is_some()
    }
}

/// Source of page captures. The production implementation talks HTTP;
/// tests inject canned captures.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> PageCapture;
}

/// HTTP fetcher with a bounded timeout and manual redirect following.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_redirects: usize,
    user_agents: Vec<String>,
}

impl HttpFetcher {
    pub fn new(
        timeout: Duration,
        max_redirects: usize,
        user_agents: Vec<String>,
    ) -> FetchResult<Self> {
        // Redirects are followed by hand so each hop can be counted.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(HttpFetcher {
            client,
            max_redirects,
            user_agents,
        })
    }

    async fn fetch_inner(&self, url: &str) -> FetchResult<PageCapture> {
        let mut current = Url::parse(url)?;
        let user_agent = self
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned();
        let mut hops = 0usize;

        loop {
            let mut request = self.client.get(current.clone());
            if let Some(ua) = &user_agent {
                request = request.header(reqwest::header::USER_AGENT, ua);
            }
            let response = request.send().await?;
            let status = response.status();

            if status.is_redirection() {
                if hops >= self.max_redirects {
                    return Err(FetchError::TooManyRedirects(self.max_redirects));
                }
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(FetchError::MissingLocation)?;
                // Location may be relative; resolve against the current URL.
                current = current.join(location)?;
                hops += 1;
                continue;
            }

            let body = response.text().await?;
            return Ok(PageCapture {
                final_url: Some(current.to_string()),
                status: Some(status.as_u16()),
                redirect_count: hops,
                body,
            });
        }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> PageCapture {
        match self.fetch_inner(url).await {
            Ok(capture) => capture,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "fetch failed, using empty capture");
                PageCapture::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_capture_is_neutral() {
        let capture = PageCapture::empty();
        assert!(!capture.has_response());
        assert_eq!(capture.redirect_count, 0);
        assert!(capture.body.is_empty());
        assert!(capture.final_url.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_url_degrades_to_empty() {
        let fetcher =
            HttpFetcher::new(Duration::from_secs(1), 5, vec!["test-agent".to_string()]).unwrap();
        let capture = fetcher.fetch("not a url at all").await;
        assert!(!capture.has_response());
    }

    #[tokio::test]
    async fn test_unreachable_host_degrades_to_empty() {
        let fetcher = HttpFetcher::new(Duration::from_millis(300), 5, Vec::new()).unwrap();
        // Reserved TLD, guaranteed not to resolve.
        let capture = fetcher.fetch("http://unreachable.invalid/").await;
        assert!(!capture.has_response());
        assert_eq!(capture.redirect_count, 0);
    }
}
