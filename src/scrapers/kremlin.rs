//! Kremlin transcript archive scraper.
//!
//! Walks the English edition of the presidential transcripts archive at
//! [en.kremlin.ru](http://en.kremlin.ru/events/president/transcripts).
//!
//! # URL Pattern
//!
//! Listing pages live at `/events/president/transcripts/page/<n>`. Article
//! links on them are site-relative paths such as
//! `/events/president/transcripts/67890`, resolved against the base URL.

use super::{FieldStrategy, Site};
use crate::error::CrawlError;
use crate::utils::stripped_text;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://en.kremlin.ru";
const LISTING_PATH: &str = "/events/president/transcripts";
/// Format of the `time.read__published` text, e.g. `December 31, 2020`.
const DATE_FORMAT: &str = "%B %d, %Y";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static LISTING_LINK: Lazy<Selector> = Lazy::new(|| selector("h3.hentry__title a[href]"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.entry-title.p-name"));
static SUMMARY: Lazy<Selector> = Lazy::new(|| selector("div.read__lead.entry-summary.p-summary"));
static PUBLISHED: Lazy<Selector> = Lazy::new(|| selector("time.read__published"));
static TIME: Lazy<Selector> = Lazy::new(|| selector("div.read__time"));
static PLACE: Lazy<Selector> = Lazy::new(|| selector("div.read__place.p-location"));
static BODY: Lazy<Selector> =
    Lazy::new(|| selector("div.entry-content.e-content.read__internal_content"));

#[derive(Debug, Clone)]
pub struct KremlinTranscripts {
    base: Url,
}

impl KremlinTranscripts {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn first_text(root: ElementRef<'_>, selector: &Selector, separator: &str) -> Option<String> {
        root.select(selector)
            .next()
            .map(|el| stripped_text(el, separator))
    }

    fn join(&self, link: &str) -> Result<String, CrawlError> {
        self.base
            .join(link)
            .map(String::from)
            .map_err(|source| CrawlError::InvalidUrl {
                link: link.to_string(),
                source,
            })
    }
}

impl Default for KremlinTranscripts {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_BASE_URL).unwrap())
    }
}

impl FieldStrategy for KremlinTranscripts {
    fn locate_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&ARTICLE).next()
    }

    fn locate_title(&self, root: ElementRef<'_>) -> Option<String> {
        Self::first_text(root, &TITLE, "")
    }

    fn locate_summary(&self, root: ElementRef<'_>) -> Option<String> {
        Self::first_text(root, &SUMMARY, "")
    }

    fn locate_date(&self, root: ElementRef<'_>) -> Option<String> {
        Self::first_text(root, &PUBLISHED, "")
    }

    fn locate_time(&self, root: ElementRef<'_>) -> Option<String> {
        Self::first_text(root, &TIME, "")
    }

    fn locate_place(&self, root: ElementRef<'_>) -> Option<String> {
        Self::first_text(root, &PLACE, "")
    }

    fn locate_body(&self, root: ElementRef<'_>) -> Option<String> {
        Self::first_text(root, &BODY, " ")
    }
}

impl Site for KremlinTranscripts {
    fn name(&self) -> &str {
        "kremlin"
    }

    fn listing_url(&self, page: u32) -> Result<String, CrawlError> {
        self.join(&format!("{LISTING_PATH}/page/{page}"))
    }

    fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let links: Vec<String> = document
            .select(&LISTING_LINK)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();
        debug!(count = links.len(), "Extracted listing links");
        links
    }

    fn article_url(&self, link: &str) -> Result<String, CrawlError> {
        self.join(link)
    }

    fn publication_year(&self, date: &str) -> Result<i32, CrawlError> {
        NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map(|d| d.year())
            .map_err(|source| CrawlError::BadDate {
                value: date.to_string(),
                source,
            })
    }
}
