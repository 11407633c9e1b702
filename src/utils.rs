//! Utility functions for text cleanup, log formatting and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Unicode normalization and newline flattening for extracted fields
//! - String truncation for logging long article bodies
//! - JSON error detection for telling a truncated state file from a corrupt one
//! - File system validation for the state directory

use scraper::ElementRef;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use unicode_normalization::UnicodeNormalization;

/// Collect the text of `element`, trimming every text node, dropping the
/// ones left empty and joining the rest with `separator`.
///
/// # Examples
///
/// ```ignore
/// // <p> Hello <b> world </b></p>
/// assert_eq!(stripped_text(p, ""), "Helloworld");
/// assert_eq!(stripped_text(p, " "), "Hello world");
/// ```
pub fn stripped_text(element: ElementRef<'_>, separator: &str) -> String {
    use itertools::Itertools;
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .join(separator)
}

/// Apply NFKC normalization and put the text on a single line.
pub fn compose_line(s: &str) -> String {
    s.nfkc().collect::<String>().replace('\n', " ")
}

/// Apply NFKD normalization and put the text on a single line.
pub fn decompose_line(s: &str) -> String {
    s.nfkd().collect::<String>().replace('\n', " ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A state file cut short by an interrupted write fails with an EOF error,
/// which is worth telling apart from a file that is simply not JSON.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("State directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
