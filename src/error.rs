//! Typed failures for fetching, extracting and persisting articles.
//!
//! Every stage of the crawl returns a [`CrawlError`] instead of aborting the
//! process, so the crawl loop can decide per failure whether to stop the run
//! or pass over a single article.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while crawling.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The request never produced a usable response (connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than `200 OK`.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// A required element was not found on the page.
    #[error("required field `{field}` is missing from the page")]
    MissingField { field: &'static str },

    /// The publication date did not match the site's date format.
    #[error("cannot parse publication date {value:?}: {source}")]
    BadDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A link from a listing page could not be resolved to an absolute URL.
    #[error("cannot resolve link {link:?}: {source}")]
    InvalidUrl {
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CrawlError {
    /// Whether the failure concerns one article only and may be skipped.
    ///
    /// Storage failures are never article-level: losing the ability to
    /// persist means every further record would be lost too.
    pub fn is_article_level(&self) -> bool {
        matches!(
            self,
            CrawlError::Transport { .. }
                | CrawlError::Status { .. }
                | CrawlError::MissingField { .. }
                | CrawlError::BadDate { .. }
                | CrawlError::InvalidUrl { .. }
        )
    }

    /// Short machine-friendly name used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CrawlError::Transport { .. } => "transport",
            CrawlError::Status { .. } => "status",
            CrawlError::MissingField { .. } => "missing_field",
            CrawlError::BadDate { .. } => "bad_date",
            CrawlError::InvalidUrl { .. } => "invalid_url",
            CrawlError::Io { .. } => "io",
            CrawlError::Json { .. } => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = CrawlError::Status {
            url: "http://example.com/page/3".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "unexpected status 503 from http://example.com/page/3"
        );
        assert_eq!(err.kind(), "status");
    }

    #[test]
    fn test_article_level_classification() {
        assert!(CrawlError::MissingField { field: "title" }.is_article_level());

        let bad_date = chrono::NaiveDate::parse_from_str("yesterday", "%B %d, %Y").unwrap_err();
        assert!(
            CrawlError::BadDate {
                value: "yesterday".to_string(),
                source: bad_date,
            }
            .is_article_level()
        );

        let io = CrawlError::Io {
            path: PathBuf::from("linki.json"),
            source: std::io::Error::other("disk full"),
        };
        assert!(!io.is_article_level());
        assert_eq!(io.kind(), "io");
    }
}
