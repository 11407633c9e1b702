//! Site scrapers: where the links and fields live on a given site's markup.
//!
//! A site is described by two traits:
//!
//! 1. [`FieldStrategy`]: locate each field of an article page (root, title,
//!    summary, date, time, place, body). The provided
//!    [`FieldStrategy::extract_article`] assembles and normalizes them.
//! 2. [`Site`]: build listing-page URLs, pull article links out of a listing
//!    page, resolve those links and read a publication year off a date.
//!
//! The crawl loop only talks to these traits, so a markup change on the
//! remote site means editing one implementation.
//!
//! # Supported Sources
//!
//! | Source | Module | Listing | Notes |
//! |--------|--------|---------|-------|
//! | Kremlin transcripts | [`kremlin`] | `/events/president/transcripts/page/<n>` | English edition |

pub mod kremlin;

use crate::error::CrawlError;
use crate::models::{ArticleRecord, NO_LOCATION};
use crate::utils::{compose_line, decompose_line};
use scraper::{ElementRef, Html};

/// Field locators for an article page.
///
/// Each `locate_*` method receives the article root found by
/// [`FieldStrategy::locate_root`] and returns the raw field text, or `None`
/// when the element is absent.
pub trait FieldStrategy {
    fn locate_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>>;
    fn locate_title(&self, root: ElementRef<'_>) -> Option<String>;
    fn locate_summary(&self, root: ElementRef<'_>) -> Option<String>;
    fn locate_date(&self, root: ElementRef<'_>) -> Option<String>;
    fn locate_time(&self, root: ElementRef<'_>) -> Option<String>;
    /// Optional field; `None` is stored as [`NO_LOCATION`].
    fn locate_place(&self, root: ElementRef<'_>) -> Option<String>;
    fn locate_body(&self, root: ElementRef<'_>) -> Option<String>;

    /// Parse an article page into an [`ArticleRecord`].
    ///
    /// Title, summary and place are NFKC-normalized, the body is
    /// NFKD-normalized, and all four are flattened onto one line. Date and
    /// time are kept as printed.
    ///
    /// # Errors
    ///
    /// [`CrawlError::MissingField`] naming the first required element not found.
    fn extract_article(&self, html: &str) -> Result<ArticleRecord, CrawlError> {
        let document = Html::parse_document(html);
        let root = self
            .locate_root(&document)
            .ok_or(CrawlError::MissingField { field: "article" })?;
        let required = |value: Option<String>, field: &'static str| {
            value.ok_or(CrawlError::MissingField { field })
        };

        let title = compose_line(&required(self.locate_title(root), "title")?);
        let summary = compose_line(&required(self.locate_summary(root), "summary")?);
        let date = required(self.locate_date(root), "date")?;
        let time = required(self.locate_time(root), "time")?;
        let place = match self.locate_place(root) {
            Some(place) => compose_line(&place),
            None => NO_LOCATION.to_string(),
        };
        let body = decompose_line(&required(self.locate_body(root), "body")?);

        Ok(ArticleRecord {
            title,
            summary,
            date,
            time,
            place,
            body,
        })
    }
}

/// A paginated site the crawl loop can walk.
pub trait Site: FieldStrategy {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Absolute URL of listing page `page` (1-based).
    fn listing_url(&self, page: u32) -> Result<String, CrawlError>;

    /// Article links on a listing page, in page order, duplicates kept.
    /// An empty result means there are no further pages.
    fn extract_links(&self, html: &str) -> Vec<String>;

    /// Absolute URL for a link taken from a listing page.
    fn article_url(&self, link: &str) -> Result<String, CrawlError>;

    /// Year of an article's `date` field.
    fn publication_year(&self, date: &str) -> Result<i32, CrawlError>;
}
