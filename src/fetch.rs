//! HTTP page fetching.
//!
//! The crawl loop only sees the [`Fetcher`] trait, so tests can drive it
//! with canned pages. [`HttpFetcher`] is the real implementation: a single
//! GET per call with a bounded timeout and browser-like headers, no retries.

use crate::error::CrawlError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Something that can turn a URL into an HTML document.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetch `url` and return the response body.
    ///
    /// Anything other than `200 OK` is a [`CrawlError::Status`].
    async fn fetch(&self, url: &str) -> Result<String, CrawlError>;
}

/// [`Fetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client sending `User-Agent: Mozilla/5.0` and `Accept: text/html`
    /// on every request and giving up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let t0 = Instant::now();
        let transport = |source| CrawlError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "Non-200 response");
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages and counts how often each URL was requested.
    /// Unknown URLs answer with a 404.
    #[derive(Debug, Default)]
    pub(crate) struct CannedFetcher {
        pages: HashMap<String, String>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl CannedFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
            self.pages.insert(url.into(), html.into());
            self
        }

        pub(crate) fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        pub(crate) fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    impl Fetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
            self.pages.get(url).cloned().ok_or_else(|| CrawlError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(Duration::from_secs(120)).is_ok());
    }

    #[tokio::test]
    async fn test_canned_fetcher_counts_and_404s() {
        let fetcher = CannedFetcher::new().page("http://example.com/a", "<p>a</p>");

        assert_eq!(fetcher.fetch("http://example.com/a").await.unwrap(), "<p>a</p>");
        let err = fetcher.fetch("http://example.com/missing").await.unwrap_err();
        assert!(matches!(err, CrawlError::Status { status: 404, .. }));

        assert_eq!(fetcher.calls("http://example.com/a"), 1);
        assert_eq!(fetcher.total_calls(), 2);
    }
}
