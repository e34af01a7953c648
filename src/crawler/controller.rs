//! Crawl controller
//!
//! A single controller task multiplexes a FIFO frontier queue and a fixed
//! worker pool over two bounded channels. The controller owns the queue and
//! the visited set and performs no I/O; workers fetch and parse pages and
//! filter their links through the caller's callback. Deduplication happens
//! only in the controller, on normalized URL keys.

use crate::crawler::fetcher::{FetchError, Fetcher, Redirect};
use crate::crawler::parse::parse_document;
use crate::url::PageUrl;
use crate::SiterakeError;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// A link found on a page.
#[derive(Debug, Clone)]
pub struct Link {
    pub url: PageUrl,
    /// Trimmed concatenation of the text nodes inside the `<a>` element.
    pub text: String,
    /// Raw `rel` attribute value (may be empty or hold tokens like `nofollow`).
    pub rel: String,
}

/// A fully fetched page. Created once per successful fetch and never
/// mutated after the `on_page` callback returns.
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was fetched (pre-normalization).
    pub url: PageUrl,
    pub status: u16,
    pub body: Vec<u8>,
    /// All links on the page, internal and external, in document order.
    pub links: Vec<Link>,
    pub title: String,
    pub description: String,
    pub canonical: String,
    /// Intermediate 3xx hops that led to this page, oldest first.
    pub redirect_chain: Vec<Redirect>,
}

/// Reason a discovered link was not followed.
///
/// Returned by the `on_new_link` callback; only used for debug logging.
#[derive(Debug, Error)]
pub enum LinkRejected {
    #[error("external link")]
    External,

    #[error("excluded by config")]
    Excluded,

    #[error("source page is not crawlable")]
    SourceNotCrawlable,

    #[error("{0}")]
    Other(String),
}

/// Called for every link discovered on a page. `Ok(())` enqueues the link's
/// URL; an error drops the link silently.
pub type OnNewLink = Arc<dyn Fn(&Page, &Link) -> Result<(), LinkRejected> + Send + Sync>;

/// Called exactly once per successfully fetched page, before any of that
/// page's outgoing links are considered for the queue.
pub type OnPage = Arc<dyn Fn(&Page) + Send + Sync>;

/// Called when fetching a URL fails. Optional; the failure is also logged.
pub type OnFetchError = Arc<dyn Fn(&PageUrl, &FetchError) + Send + Sync>;

/// Crawler configuration.
pub struct CrawlerConfig {
    pub base_url: PageUrl,
    /// Worker pool size; values below 1 fall back to the default of 10.
    pub worker_count: usize,
    /// Seed paths, resolved against the base URL.
    pub entrypoints: Vec<String>,
    pub fetcher: Arc<dyn Fetcher>,
    pub on_new_link: OnNewLink,
    pub on_page: OnPage,
    pub on_fetch_error: Option<OnFetchError>,
}

/// Outcome of one worker task.
struct WorkerResult {
    page_url: PageUrl,
    page: Option<Page>,
    /// URLs that passed the `on_new_link` filter, in document order.
    to_queue: Vec<PageUrl>,
    err: Option<FetchError>,
}

/// Manages the crawling process.
pub struct Crawler {
    cfg: CrawlerConfig,
}

impl Crawler {
    pub fn new(mut cfg: CrawlerConfig) -> Self {
        if cfg.worker_count < 1 {
            cfg.worker_count = 10;
        }
        Self { cfg }
    }

    /// Executes a bounded breadth-first traversal from the entrypoints.
    ///
    /// Returns after the queue is empty and no worker is in flight, or after
    /// cancellation once every in-flight result has been drained. Cancellation
    /// surfaces as [`SiterakeError::Cancelled`]; per-page fetch failures never
    /// do.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), SiterakeError> {
        let worker_count = self.cfg.worker_count;
        tracing::debug!("starting crawler with {} workers", worker_count);

        // Both channels are sized to the worker count so the controller never
        // blocks handing a task to an idle worker and workers never block
        // sending a result while the controller is mid-iteration.
        let (task_tx, task_rx) = mpsc::channel::<PageUrl>(worker_count);
        let (result_tx, mut result_rx) = mpsc::channel::<WorkerResult>(worker_count);
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            workers.push(tokio::spawn(worker_loop(
                id + 1,
                Arc::clone(&task_rx),
                result_tx.clone(),
                Arc::clone(&self.cfg.fetcher),
                self.cfg.on_new_link.clone(),
                cancel.clone(),
            )));
        }
        drop(result_tx);

        // Controller state. The queue and visited set are owned here and
        // never shared with workers.
        let mut queue: VecDeque<PageUrl> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut in_flight = 0usize;

        for entry in &self.cfg.entrypoints {
            let resolved = match self.cfg.base_url.resolve(entry) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("invalid entrypoint path {}: {}", entry, e);
                    continue;
                }
            };
            let key = resolved.normalized_key(&self.cfg.base_url);
            if visited.insert(key) {
                queue.push_back(resolved);
            }
        }
        tracing::debug!("initial queue populated with {} urls", queue.len());

        let mut cancelled = false;
        while !queue.is_empty() || in_flight > 0 {
            tokio::select! {
                // Cancellation wins over ready sends and receives, so a
                // cancelled crawl never dispatches another task.
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("crawl cancelled, shutting down");
                    cancelled = true;
                    break;
                }

                permit = task_tx.reserve(), if !queue.is_empty() => {
                    let Ok(permit) = permit else { break };
                    if let Some(task) = queue.pop_front() {
                        tracing::debug!("sent task {}", task);
                        permit.send(task);
                        in_flight += 1;
                    }
                }

                result = result_rx.recv() => {
                    let Some(result) = result else { break };
                    in_flight -= 1;
                    self.handle_result(result, &cancel, &mut queue, &mut visited);
                }
            }
        }

        // Workers may already have committed to producing a result; drain
        // them all before closing the task channel. Their queue
        // contributions are discarded.
        tracing::debug!("work finished or cancelled, draining {} in-flight results", in_flight);
        while in_flight > 0 {
            match result_rx.recv().await {
                Some(_) => in_flight -= 1,
                None => break,
            }
        }

        // Closing the task channel ends each worker's receive loop.
        drop(task_tx);
        for handle in workers {
            let _ = handle.await;
        }

        if cancelled {
            return Err(SiterakeError::Cancelled);
        }
        Ok(())
    }

    fn handle_result(
        &self,
        result: WorkerResult,
        cancel: &CancellationToken,
        queue: &mut VecDeque<PageUrl>,
        visited: &mut HashSet<String>,
    ) {
        tracing::debug!("received result for {}", result.page_url);

        if let Some(err) = result.err {
            // Cancellation aborts in-flight fetches; logging those would be
            // noise, not signal.
            if !cancel.is_cancelled() {
                tracing::error!("failed to process {}: {}", result.page_url, err);
                if let Some(on_fetch_error) = &self.cfg.on_fetch_error {
                    on_fetch_error(&result.page_url, &err);
                }
            }
            return;
        }

        if let Some(page) = &result.page {
            (self.cfg.on_page)(page);
        }

        for link in result.to_queue {
            let key = link.normalized_key(&self.cfg.base_url);
            if visited.insert(key) {
                tracing::debug!("queued new link {}", link);
                queue.push_back(link);
            }
        }
    }
}

/// Fetches tasks from the shared channel until it closes.
async fn worker_loop(
    id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<PageUrl>>>,
    results: mpsc::Sender<WorkerResult>,
    fetcher: Arc<dyn Fetcher>,
    on_new_link: OnNewLink,
    cancel: CancellationToken,
) {
    tracing::debug!("worker {} started", id);

    loop {
        let task = {
            let mut rx = tasks.lock().await;
            rx.recv().await
        };
        let Some(page_url) = task else { break };
        tracing::debug!("worker {} received task {}", id, page_url);

        let result = match fetcher.fetch(&cancel, &page_url).await {
            Ok(fetched) => {
                let parsed = parse_document(&fetched.body, &page_url);
                let page = Page {
                    url: page_url.clone(),
                    status: fetched.status,
                    body: fetched.body,
                    links: parsed.links,
                    title: parsed.title,
                    description: parsed.description,
                    canonical: parsed.canonical,
                    redirect_chain: fetched.redirect_chain,
                };

                let mut to_queue = Vec::new();
                for link in &page.links {
                    match on_new_link(&page, link) {
                        Ok(()) => to_queue.push(link.url.clone()),
                        Err(reason) => {
                            tracing::debug!("link {} filtered out: {}", link.url, reason);
                        }
                    }
                }

                WorkerResult {
                    page_url,
                    page: Some(page),
                    to_queue,
                    err: None,
                }
            }
            Err(err) => WorkerResult {
                page_url,
                page: None,
                to_queue: Vec::new(),
                err: Some(err),
            },
        };

        // The controller may already be gone if the crawl was torn down.
        if results.send(result).await.is_err() {
            break;
        }
    }

    tracing::debug!("worker {} shutting down", id);
}
