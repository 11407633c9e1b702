//! Command-line interface definitions for the transcript crawler.
//!
//! Every option has a default, so a bare `transcript_crawler` crawls back to
//! 2021 and keeps its state in the current directory. Each option can also
//! be set through an environment variable.

use crate::crawl::{CrawlOptions, ErrorPolicy};
use crate::scrapers::kremlin::DEFAULT_BASE_URL;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Command-line arguments for the transcript crawler.
///
/// # Examples
///
/// ```sh
/// # Crawl back to the start of 2021, state in ./
/// transcript_crawler
///
/// # Go further back and keep going past broken articles
/// transcript_crawler --target-year 2018 --on-error skip --state-dir ./state
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Stop at the first article published in the year before this one
    #[arg(short, long, env = "CRAWL_TARGET_YEAR", default_value_t = 2021)]
    pub target_year: i32,

    /// Directory holding linki.json and allcontent.json
    #[arg(short, long, env = "CRAWL_STATE_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// Site root that listing and article paths are resolved against
    #[arg(long, env = "CRAWL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Last listing page to visit
    #[arg(long, env = "CRAWL_MAX_PAGES", default_value_t = 99)]
    pub max_pages: u32,

    /// Pause after each listing page, in milliseconds
    #[arg(long, env = "CRAWL_LISTING_DELAY_MS", default_value_t = 2000)]
    pub listing_delay_ms: u64,

    /// Pause after each article page, in milliseconds
    #[arg(long, env = "CRAWL_ARTICLE_DELAY_MS", default_value_t = 1000)]
    pub article_delay_ms: u64,

    /// HTTP request timeout, in seconds
    #[arg(long, env = "CRAWL_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// What to do when one article cannot be fetched or parsed
    #[arg(long, env = "CRAWL_ON_ERROR", value_enum, default_value_t = ErrorPolicy::Abort)]
    pub on_error: ErrorPolicy,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            target_year: self.target_year,
            max_pages: self.max_pages,
            listing_delay: Duration::from_millis(self.listing_delay_ms),
            article_delay: Duration::from_millis(self.article_delay_ms),
            on_error: self.on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["transcript_crawler"]);

        assert_eq!(cli.target_year, 2021);
        assert_eq!(cli.state_dir, PathBuf::from("."));
        assert_eq!(cli.base_url.as_str(), "http://en.kremlin.ru/");
        assert_eq!(cli.timeout(), Duration::from_secs(120));

        let opts = cli.crawl_options();
        assert_eq!(opts.max_pages, 99);
        assert_eq!(opts.listing_delay, Duration::from_secs(2));
        assert_eq!(opts.article_delay, Duration::from_secs(1));
        assert_eq!(opts.on_error, ErrorPolicy::Abort);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "transcript_crawler",
            "-t",
            "2018",
            "-s",
            "/tmp/state",
            "--max-pages",
            "5",
            "--article-delay-ms",
            "0",
            "--on-error",
            "skip",
        ]);

        assert_eq!(cli.target_year, 2018);
        assert_eq!(cli.state_dir, PathBuf::from("/tmp/state"));
        let opts = cli.crawl_options();
        assert_eq!(opts.max_pages, 5);
        assert_eq!(opts.article_delay, Duration::ZERO);
        assert_eq!(opts.on_error, ErrorPolicy::Skip);
    }

    #[test]
    fn test_cli_rejects_bad_base_url() {
        assert!(Cli::try_parse_from(["transcript_crawler", "--base-url", "not a url"]).is_err());
    }
}
