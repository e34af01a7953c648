//! Headless-browser fetcher
//!
//! Drives a WebDriver session so JavaScript-rendered pages can be crawled.
//! Fetches are serialized through a semaphore sized to `max_tabs` (default
//! 1); after navigation the fetcher sleeps `wait_ms` before reading the
//! rendered DOM. The WebDriver endpoint does not expose the main-document
//! status code, so pages report 200 unless navigation itself fails.

use crate::crawler::fetcher::{FetchError, FetchResult, Fetcher};
use crate::url::PageUrl;
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

/// Options for the browser fetcher.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Milliseconds to wait after navigation for scripts to run.
    pub wait_ms: u64,
    /// Maximum concurrent fetches (browser tabs).
    pub max_tabs: usize,
    /// WebDriver endpoint, e.g. a local chromedriver.
    pub webdriver_url: String,
    /// Path to the browser binary; empty uses the driver's default.
    pub executable_path: String,
    /// Additional browser flags.
    pub flags: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            wait_ms: 2000,
            max_tabs: 1,
            webdriver_url: "http://localhost:9515".to_string(),
            executable_path: String::new(),
            flags: Vec::new(),
        }
    }
}

/// Fetches pages through a headless browser session.
pub struct BrowserFetcher {
    driver: Mutex<WebDriver>,
    tabs: Semaphore,
    wait_ms: u64,
}

impl BrowserFetcher {
    /// Connects to the WebDriver endpoint and starts a browser session.
    pub async fn new(opts: BrowserOptions) -> Result<Self, FetchError> {
        let max_tabs = opts.max_tabs.max(1);
        let wait_ms = if opts.wait_ms == 0 { 2000 } else { opts.wait_ms };

        let mut caps = DesiredCapabilities::chrome();
        if !opts.executable_path.is_empty() {
            caps.set_binary(&opts.executable_path)
                .map_err(|e| browser_error(&opts.webdriver_url, e))?;
        }
        caps.set_headless()
            .map_err(|e| browser_error(&opts.webdriver_url, e))?;
        for flag in &opts.flags {
            caps.add_arg(flag)
                .map_err(|e| browser_error(&opts.webdriver_url, e))?;
        }

        tracing::info!("starting headless browser session via {}", opts.webdriver_url);
        let driver = WebDriver::new(&opts.webdriver_url, caps)
            .await
            .map_err(|e| browser_error(&opts.webdriver_url, e))?;

        Ok(Self {
            driver: Mutex::new(driver),
            tabs: Semaphore::new(max_tabs),
            wait_ms,
        })
    }

    async fn render(&self, url: &PageUrl) -> Result<String, FetchError> {
        let driver = self.driver.lock().await;
        driver
            .goto(url.to_string())
            .await
            .map_err(|e| browser_error(url.as_url().as_str(), e))?;
        tokio::time::sleep(Duration::from_millis(self.wait_ms)).await;
        driver
            .source()
            .await
            .map_err(|e| browser_error(url.as_url().as_str(), e))
    }
}

fn browser_error(url: &str, e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        url: &PageUrl,
    ) -> Result<FetchResult, FetchError> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            permit = self.tabs.acquire() => permit,
        };
        let _permit = permit.map_err(|e| browser_error(url.as_url().as_str(), e))?;

        let html = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            html = self.render(url) => html?,
        };

        Ok(FetchResult {
            status: 200,
            body: html.into_bytes(),
            redirect_chain: Vec::new(),
        })
    }

    async fn close(&self) {
        let driver = self.driver.lock().await;
        if let Err(e) = driver.clone().quit().await {
            tracing::warn!("failed to quit browser session: {}", e);
        }
    }
}
