//! # Transcript Crawler
//!
//! Crawls the English Kremlin transcript archive from the newest listing
//! page backwards, recording every article until it meets one published
//! in the year before the target year.
//!
//! ## Usage
//!
//! ```sh
//! transcript_crawler --target-year 2021 --state-dir ./state
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one GET per page through [`fetch::HttpFetcher`]
//! 2. **Link extraction**: article links from each listing page
//! 3. **Content extraction**: six text fields from each article page
//! 4. **Crawl loop**: dedup, stop at the target year, flush after every article
//!
//! State lives in `linki.json` and `allcontent.json` (see [`store`]); a link
//! recorded in an earlier run is never fetched again.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod crawl;
mod error;
mod fetch;
mod models;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use crawl::Crawler;
use fetch::HttpFetcher;
use scrapers::kremlin::KremlinTranscripts;
use store::JsonStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("transcript_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.state_dir).await {
        error!(
            path = %args.state_dir.display(),
            error = %e,
            "State directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let store = JsonStore::in_dir(&args.state_dir);
    let mut state = store.load().await?;
    if state.is_empty() {
        info!("No saved state; starting from the first page");
    } else {
        let oldest = &state.entries()[state.len() - 1];
        info!(
            known = state.len(),
            oldest_date = %oldest.record.date,
            "Resuming from saved state"
        );
    }

    let fetcher = HttpFetcher::new(args.timeout())?;
    let site = KremlinTranscripts::new(args.base_url.clone());
    let crawler = Crawler::new(&fetcher, &site, &store, args.crawl_options());

    match crawler.run(&mut state).await {
        Ok(report) => {
            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                recorded = report.recorded,
                total = state.len(),
                links = %store.links_path().display(),
                content = %store.content_path().display(),
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                kind = e.kind(),
                error = %e,
                saved = state.len(),
                "Crawl aborted; records up to this point are saved"
            );
            Err(e.into())
        }
    }
}
