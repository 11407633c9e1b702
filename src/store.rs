//! On-disk crawl state.
//!
//! The state is kept in two JSON files inside the state directory:
//!
//! ```text
//! state_dir/
//! ├── linki.json        # ["<link>", ...]
//! └── allcontent.json   # [[title, summary, date, time, place, body], ...]
//! ```
//!
//! Both files are written from the same ordered list of
//! [`CrawlEntry`](crate::models::CrawlEntry) values, so entry `i` of one
//! always belongs to entry `i` of the other. Each file is first written to a
//! `.tmp` sibling and then renamed over the old one, so an interrupted write
//! leaves the previous version intact.
//!
//! A missing or unreadable file loads as empty. When that (or a length
//! mismatch between the two files) means data is dropped, the files are
//! copied to `linki.json.bak` / `allcontent.json.bak` before the next write.

use crate::error::CrawlError;
use crate::models::{ArticleRecord, CrawlEntry, CrawlState};
use crate::utils::looks_truncated;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub const LINKS_FILE: &str = "linki.json";
pub const CONTENT_FILE: &str = "allcontent.json";

#[derive(Debug, Clone)]
pub struct JsonStore {
    links_path: PathBuf,
    content_path: PathBuf,
}

impl JsonStore {
    /// A store using the standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            links_path: dir.join(LINKS_FILE),
            content_path: dir.join(CONTENT_FILE),
        }
    }

    pub fn links_path(&self) -> &Path {
        &self.links_path
    }

    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    /// Load the state left by earlier runs.
    ///
    /// Links and records are paired by position. If one file holds more
    /// entries than the other the unpaired tail is dropped; those links are
    /// then simply crawled again.
    ///
    /// Whenever loading discards data (an unreadable file, or files out of
    /// step) both files are first copied to `<name>.bak`, since the next
    /// [`save`](Self::save) rewrites them from what was kept.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Io`] if that backup cannot be written. Nothing is
    /// discarded in that case.
    #[instrument(level = "info", skip_all)]
    pub async fn load(&self) -> Result<CrawlState, CrawlError> {
        let links = read_state_file::<String>(&self.links_path).await;
        let records = read_state_file::<ArticleRecord>(&self.content_path).await;

        let lossy = match (&links, &records) {
            (StateFile::Unreadable, _) | (_, StateFile::Unreadable) => true,
            (l, r) => l.len() != r.len(),
        };
        if lossy {
            warn!(
                links = links.len(),
                records = records.len(),
                "State files are unreadable or out of step; keeping the paired prefix"
            );
            self.back_up().await?;
        }

        let entries: Vec<CrawlEntry> = links
            .into_vec()
            .into_iter()
            .zip(records.into_vec())
            .map(|(link, record)| CrawlEntry { link, record })
            .collect();
        info!(entries = entries.len(), "Loaded crawl state");
        Ok(CrawlState::from_entries(entries))
    }

    /// Copy every existing state file to a `.bak` sibling.
    async fn back_up(&self) -> Result<(), CrawlError> {
        for path in [&self.links_path, &self.content_path] {
            if !fs::try_exists(path).await.unwrap_or(false) {
                continue;
            }
            let backup = backup_path(path);
            fs::copy(path, &backup)
                .await
                .map_err(|source| CrawlError::Io {
                    path: backup.clone(),
                    source,
                })?;
            warn!(path = %path.display(), backup = %backup.display(), "Backed up state file");
        }
        Ok(())
    }

    /// Overwrite both files with the full contents of `state`.
    #[instrument(level = "debug", skip_all, fields(entries = state.len()))]
    pub async fn save(&self, state: &CrawlState) -> Result<(), CrawlError> {
        let records: Vec<&ArticleRecord> = state.records().collect();
        let links: Vec<&str> = state.links().collect();

        // Content first: a crash between the two writes leaves an extra
        // record, which load() drops, rather than a link with no record.
        save_json(&records, &self.content_path).await?;
        save_json(&links, &self.links_path).await?;
        debug!("Flushed crawl state");
        Ok(())
    }
}

/// Outcome of reading one state file.
enum StateFile<T> {
    Missing,
    Unreadable,
    Loaded(Vec<T>),
}

impl<T> StateFile<T> {
    fn len(&self) -> usize {
        match self {
            StateFile::Loaded(items) => items.len(),
            _ => 0,
        }
    }

    fn into_vec(self) -> Vec<T> {
        match self {
            StateFile::Loaded(items) => items,
            _ => Vec::new(),
        }
    }
}

async fn read_state_file<T: DeserializeOwned>(path: &Path) -> StateFile<T> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No state file yet");
            return StateFile::Missing;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read state file; starting empty");
            return StateFile::Unreadable;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(items) => StateFile::Loaded(items),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                truncated = looks_truncated(&e),
                "State file is not valid JSON; starting empty"
            );
            StateFile::Unreadable
        }
    }
}

/// Read a JSON array from `path`, falling back to an empty list when the
/// file is absent, unreadable or not valid JSON of the expected shape.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    read_state_file(path).await.into_vec()
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Where [`JsonStore::load`] keeps a copy of `path` before discarding data.
pub fn backup_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".bak")
}

/// Write `data` as 4-space indented JSON, replacing `path` atomically.
pub async fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<(), CrawlError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut serializer)
        .map_err(|source| CrawlError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let tmp = sibling_with_suffix(path, ".tmp");

    let io = |source| CrawlError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, &buf).await.map_err(io)?;
    fs::rename(&tmp, path).await.map_err(io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_record;

    fn sample_state() -> CrawlState {
        let mut state = CrawlState::default();
        state.record("/t/2".into(), sample_record("Встреча с Президентом", "March 1, 2022"));
        state.record("/t/1".into(), sample_record("Press statements", "January 15, 2022"));
        state
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        let state = sample_state();

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.entries(), state.entries());
        assert!(loaded.has_seen("/t/2"));
        assert!(loaded.has_seen("/t/1"));
    }

    #[tokio::test]
    async fn test_saved_files_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        store.save(&sample_state()).await.unwrap();

        let links = std::fs::read_to_string(tmp.path().join(LINKS_FILE)).unwrap();
        assert_eq!(links, "[\n    \"/t/2\",\n    \"/t/1\"\n]");

        let content = std::fs::read_to_string(tmp.path().join(CONTENT_FILE)).unwrap();
        // Non-ASCII text is written as-is, not escaped.
        assert!(content.contains("Встреча с Президентом"));
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[1][2], "January 15, 2022");
        assert_eq!(parsed[1].as_array().unwrap().len(), 6);

        assert!(!tmp.path().join("linki.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_files_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let state = JsonStore::in_dir(tmp.path()).load().await.unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_links_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        store.save(&sample_state()).await.unwrap();
        std::fs::write(store.links_path(), "{ this is not json").unwrap();

        let state = store.load().await.unwrap();
        assert!(state.is_empty());
        assert!(!state.has_seen("/t/2"));
    }

    #[tokio::test]
    async fn test_corrupt_links_backs_up_readable_content() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        store.save(&sample_state()).await.unwrap();
        let saved_content = std::fs::read_to_string(store.content_path()).unwrap();
        std::fs::write(store.links_path(), "{ garbage").unwrap();

        let state = store.load().await.unwrap();
        store.save(&state).await.unwrap();

        let backup = std::fs::read_to_string(backup_path(store.content_path())).unwrap();
        assert_eq!(backup, saved_content);
        let kept: Vec<ArticleRecord> = serde_json::from_str(&backup).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "Встреча с Президентом");

        let links_backup = std::fs::read_to_string(backup_path(store.links_path())).unwrap();
        assert_eq!(links_backup, "{ garbage");
    }

    #[tokio::test]
    async fn test_consistent_state_is_not_backed_up() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        store.save(&sample_state()).await.unwrap();

        store.load().await.unwrap();

        assert!(!backup_path(store.links_path()).exists());
        assert!(!backup_path(store.content_path()).exists());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(LINKS_FILE), r#"{"links": []}"#).unwrap();
        let links: Vec<String> = load_json(&tmp.path().join(LINKS_FILE)).await;
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_load_keeps_paired_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        store.save(&sample_state()).await.unwrap();
        std::fs::write(store.links_path(), r#"["/t/2", "/t/1", "/t/0"]"#).unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.len(), 2);
        assert!(!state.has_seen("/t/0"));
        assert!(backup_path(store.links_path()).exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonStore::in_dir(tmp.path());
        store.save(&sample_state()).await.unwrap();
        store.save(&CrawlState::default()).await.unwrap();

        let links = std::fs::read_to_string(store.links_path()).unwrap();
        assert_eq!(links, "[]");
        assert!(store.load().await.unwrap().is_empty());
    }
}
