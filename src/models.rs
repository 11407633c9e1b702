//! Data models for crawled articles and the crawl state.
//!
//! - [`ArticleRecord`]: the six text fields extracted from one article page
//! - [`CrawlEntry`]: a record paired with the listing link it came from
//! - [`CrawlState`]: the ordered entries of every run so far, plus a seen-link index
//!
//! On disk the records keep the historical layout of a 6-element array
//! `[title, summary, date, time, place, body]`, stored apart from the links.
//! In memory the link and the record always travel together.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Value stored in `place` when an article carries no location.
pub const NO_LOCATION: &str = "No location";

/// The on-disk tuple layout of an [`ArticleRecord`].
type RecordTuple = (String, String, String, String, String, String);

/// The fields extracted from a single article page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordTuple", into = "RecordTuple")]
pub struct ArticleRecord {
    pub title: String,
    pub summary: String,
    /// Publication date as printed on the page, e.g. `"March 1, 2022"`.
    pub date: String,
    /// Publication time as printed on the page.
    pub time: String,
    /// Location, or [`NO_LOCATION`].
    pub place: String,
    pub body: String,
}

impl From<RecordTuple> for ArticleRecord {
    fn from((title, summary, date, time, place, body): RecordTuple) -> Self {
        Self {
            title,
            summary,
            date,
            time,
            place,
            body,
        }
    }
}

impl From<ArticleRecord> for RecordTuple {
    fn from(r: ArticleRecord) -> Self {
        (r.title, r.summary, r.date, r.time, r.place, r.body)
    }
}

/// A recorded article together with the link it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlEntry {
    /// The link exactly as it appeared on the listing page.
    pub link: String,
    pub record: ArticleRecord,
}

/// Everything collected so far, in recording order.
#[derive(Debug, Default)]
pub struct CrawlState {
    entries: Vec<CrawlEntry>,
    seen: HashSet<String>,
}

impl CrawlState {
    /// Build a state from entries loaded off disk, keeping their order.
    pub fn from_entries(entries: Vec<CrawlEntry>) -> Self {
        let seen = entries.iter().map(|e| e.link.clone()).collect();
        Self { entries, seen }
    }

    pub fn entries(&self) -> &[CrawlEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `link` has already been recorded, in this run or an earlier one.
    pub fn has_seen(&self, link: &str) -> bool {
        self.seen.contains(link)
    }

    /// Append a record under `link`. Returns `false` (and changes nothing)
    /// if the link was already recorded.
    pub fn record(&mut self, link: String, record: ArticleRecord) -> bool {
        if !self.seen.insert(link.clone()) {
            return false;
        }
        self.entries.push(CrawlEntry { link, record });
        true
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.link.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.entries.iter().map(|e| &e.record)
    }
}
