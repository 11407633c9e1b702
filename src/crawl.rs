//! The crawl loop: walk listing pages, skip known links, record new
//! articles, stop at the first article from the year before the target year.
//!
//! # Flow
//!
//! ```text
//! page 1..=max_pages
//!   fetch listing ─▶ no links? ─▶ Done(NoMorePages)
//!   for each link
//!     seen? ─▶ skip
//!     fetch + extract + parse year
//!     year == target - 1? ─▶ Done(Boundary), article not recorded
//!     record, flush to disk, pause
//! ─▶ Done(PageLimit)
//! ```
//!
//! The state is flushed after every recorded article, so a failure part way
//! through a run keeps everything recorded before it.

use crate::error::CrawlError;
use crate::fetch::Fetcher;
use crate::models::{ArticleRecord, CrawlState};
use crate::scrapers::Site;
use crate::store::JsonStore;
use crate::utils::truncate_for_log;
use clap::ValueEnum;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// What to do when a single article cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicy {
    /// End the run with the error.
    Abort,
    /// Log the article, leave it unrecorded and carry on.
    Skip,
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// The first article published in the year before this one ends the crawl.
    pub target_year: i32,
    /// Last listing page to visit (pages are 1-based).
    pub max_pages: u32,
    /// Pause after every listing page.
    pub listing_delay: Duration,
    /// Pause after every article page.
    pub article_delay: Duration,
    pub on_error: ErrorPolicy,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            target_year: 2021,
            max_pages: 99,
            listing_delay: Duration::from_secs(2),
            article_delay: Duration::from_secs(1),
            on_error: ErrorPolicy::Abort,
        }
    }
}

/// Why the crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Listing page `page` had no article links.
    NoMorePages { page: u32 },
    /// The article under `link` was published in `year`, the year before the target.
    Boundary { link: String, year: i32 },
    /// Every page up to the configured maximum was visited.
    PageLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages_visited: u32,
    pub recorded: usize,
    pub skipped_seen: usize,
    pub skipped_failed: usize,
    pub stop: StopReason,
}

/// Drives a [`Site`] through a [`Fetcher`], keeping the [`JsonStore`] current.
pub struct Crawler<'a, F, S> {
    fetcher: &'a F,
    site: &'a S,
    store: &'a JsonStore,
    options: CrawlOptions,
}

impl<'a, F, S> Crawler<'a, F, S>
where
    F: Fetcher,
    S: Site,
{
    pub fn new(fetcher: &'a F, site: &'a S, store: &'a JsonStore, options: CrawlOptions) -> Self {
        Self {
            fetcher,
            site,
            store,
            options,
        }
    }

    /// Crawl until no links remain, the target year boundary is reached or
    /// the page limit is hit, appending new articles to `state`.
    ///
    /// # Errors
    ///
    /// Listing page failures and storage failures always end the run.
    /// Article failures end it under [`ErrorPolicy::Abort`]. Records added
    /// before the error are already on disk.
    #[instrument(level = "info", skip_all, fields(site = self.site.name(), target_year = self.options.target_year))]
    pub async fn run(&self, state: &mut CrawlState) -> Result<CrawlReport, CrawlError> {
        let t0 = Instant::now();
        let mut pages_visited = 0;
        let mut recorded = 0;
        let mut skipped_seen = 0;
        let mut skipped_failed = 0;

        let stop = 'crawl: {
            for page in 1..=self.options.max_pages {
                let url = self.site.listing_url(page)?;
                let links = self.site.extract_links(&self.fetcher.fetch(&url).await?);
                pages_visited += 1;
                info!(page, count = links.len(), ?links, "Listing page links");
                pause(self.options.listing_delay).await;

                if links.is_empty() {
                    info!(page, "No more pages to check");
                    break 'crawl StopReason::NoMorePages { page };
                }

                for link in links {
                    if state.has_seen(&link) {
                        info!(%link, "Skipping already recorded link");
                        skipped_seen += 1;
                        continue;
                    }

                    let (record, year) = match self.visit(&link).await {
                        Ok(visited) => visited,
                        Err(e) if e.is_article_level() && self.options.on_error == ErrorPolicy::Skip => {
                            warn!(%link, kind = e.kind(), error = %e, "Skipping article");
                            skipped_failed += 1;
                            pause(self.options.article_delay).await;
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    info!(title = %record.title, date = %record.date, "Fetched article");
                    if year == self.options.target_year - 1 {
                        info!(
                            %link,
                            year,
                            target_year = self.options.target_year,
                            "Found all content back to the target year; stopping"
                        );
                        break 'crawl StopReason::Boundary { link, year };
                    }

                    state.record(link, record);
                    self.store.save(state).await?;
                    recorded += 1;
                    pause(self.options.article_delay).await;
                }
            }
            StopReason::PageLimit
        };

        self.store.save(state).await?;
        let report = CrawlReport {
            pages_visited,
            recorded,
            skipped_seen,
            skipped_failed,
            stop,
        };
        info!(
            ?report.stop,
            pages = report.pages_visited,
            recorded = report.recorded,
            skipped_seen = report.skipped_seen,
            skipped_failed = report.skipped_failed,
            total = state.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Crawl finished"
        );
        Ok(report)
    }

    /// Fetch and parse one article; returns the record and its publication year.
    #[instrument(level = "debug", skip(self))]
    async fn visit(&self, link: &str) -> Result<(ArticleRecord, i32), CrawlError> {
        let url = self.site.article_url(link)?;
        let html = self.fetcher.fetch(&url).await?;
        let record = self.site.extract_article(&html)?;
        let year = self.site.publication_year(&record.date)?;
        debug!(body = %truncate_for_log(&record.body, 200), "Article body");
        Ok((record, year))
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}
