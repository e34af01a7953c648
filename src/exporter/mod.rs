//! Mirror exporter
//!
//! Drives the crawler with callbacks that follow internal, non-excluded
//! links and write each page body to the mirror directory, preserving the
//! URL-to-path mapping. Pages matching the extract-only patterns are
//! harvested for links but never written.

use crate::config::Config;
use crate::crawler::{Crawler, CrawlerConfig, Fetcher, LinkRejected, Page};
use crate::{Result, SiterakeError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counters accumulated over one export run.
#[derive(Debug, Default)]
struct ExportStats {
    exported: AtomicUsize,
    skipped: AtomicUsize,
    write_failures: AtomicUsize,
}

/// Manages the export process.
pub struct Export {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
}

impl Export {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Crawls the site and writes the mirror.
    ///
    /// Cancellation is a normal exit: whatever was exported stays on disk
    /// and the error is swallowed so the CLI can exit cleanly.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let base_url = self.config.base_url()?;
        let output = PathBuf::from(&self.config.output);
        let exclude = self.config.exclude_patterns();
        let extract_only = self.config.extract_only_patterns();

        let on_new_link = {
            let base_url = base_url.clone();
            move |page: &Page, link: &crate::crawler::Link| {
                // Only pages that parse as HTML can donate links.
                if !page.url.is_html_like() {
                    return Err(LinkRejected::SourceNotCrawlable);
                }
                if !link.url.is_internal(&base_url) {
                    return Err(LinkRejected::External);
                }
                if exclude.match_any(link.url.path()) {
                    return Err(LinkRejected::Excluded);
                }
                Ok(())
            }
        };

        let stats = Arc::new(ExportStats::default());
        let on_page = {
            let output = output.clone();
            let stats = Arc::clone(&stats);
            move |page: &Page| {
                if extract_only.match_any(page.url.path()) {
                    tracing::info!("extracting links only, skipping save for {}", page.url);
                    stats.skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                match save_page(page, &output) {
                    Ok(()) => {
                        stats.exported.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::error!("failed to save {}: {}", page.url, e);
                        stats.write_failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        };

        let crawler = Crawler::new(CrawlerConfig {
            base_url,
            worker_count: self.config.workers_count,
            entrypoints: self.config.pages.entrypoints.clone(),
            fetcher: Arc::clone(&self.fetcher),
            on_new_link: Arc::new(on_new_link),
            on_page: Arc::new(on_page),
            on_fetch_error: None,
        });

        let result = crawler.run(cancel).await;

        tracing::info!(
            "exported {} pages ({} extract-only, {} write failures)",
            stats.exported.load(Ordering::Relaxed),
            stats.skipped.load(Ordering::Relaxed),
            stats.write_failures.load(Ordering::Relaxed)
        );

        match result {
            Ok(()) => {
                tracing::info!("export finished");
                Ok(())
            }
            Err(SiterakeError::Cancelled) => {
                tracing::info!("export cancelled");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Writes a page's body to its mirror path, creating intermediate
/// directories.
fn save_page(page: &Page, output: &Path) -> std::io::Result<()> {
    let path = page.url.to_path(output);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &page.body)?;
    tracing::info!("exported {} to {}", page.url, path.display());
    Ok(())
}
