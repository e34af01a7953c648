//! HTTP fetcher implementation
//!
//! Fetchers retrieve `(status, body, redirect chain)` for a URL under a
//! cancellation token. The plain HTTP implementation lives here; the
//! headless-browser implementation is in [`crate::crawler::browser`].

use crate::url::PageUrl;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Maximum number of redirect hops followed before giving up and returning
/// the last observed response.
const MAX_REDIRECTS: usize = 10;

/// An intermediate hop in a redirect chain.
///
/// `url` is the URL that produced a 3xx response, not its target. Chains
/// are ordered oldest-first and exclude the final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
    pub status: u16,
}

/// The raw outcome of fetching a URL.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Final status code, after following redirects.
    pub status: u16,
    /// Fully buffered response body.
    pub body: Vec<u8>,
    /// Intermediate 3xx hops, oldest first.
    pub redirect_chain: Vec<Redirect>,
}

/// Errors produced while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out for {url}")]
    Timeout { url: String },

    #[error("fetch cancelled")]
    Cancelled,

    #[error("could not reach {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not read response body for {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid redirect location from {url}: {message}")]
    BadRedirect { url: String, message: String },

    #[error("browser error for {url}: {message}")]
    Browser { url: String, message: String },
}

impl FetchError {
    /// True when the failure was a timeout; used as a lint input.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Abstracts how pages are fetched.
///
/// Implementations must be safe for concurrent calls; a single fetcher is
/// shared across all crawl workers. `close` releases long-lived resources
/// and is invoked by the CLI layer, not the crawl controller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        url: &PageUrl,
    ) -> Result<FetchResult, FetchError>;

    async fn close(&self) {}
}

/// Retry policy for transient fetch failures.
///
/// Applies exponential backoff: `base_delay * 2^attempt`. Only server
/// errors (5xx), timeouts, and transport failures are retried; client
/// errors and cancellation never are.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries; every failure is final.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    fn retryable_status(status: u16) -> bool {
        (500..600).contains(&status)
    }

    fn retryable_error(err: &FetchError) -> bool {
        matches!(err, FetchError::Timeout { .. } | FetchError::Http { .. })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

/// Fetches pages with a plain HTTP client.
///
/// Redirects are followed manually so the chain of intermediate 3xx
/// responses can be reported to the linter.
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher with no retries, building a default client
    /// (10 second timeout, manual redirect handling) when none is supplied.
    pub fn new(client: Option<Client>) -> Result<Self, reqwest::Error> {
        Self::with_retry(client, RetryPolicy::none())
    }

    /// Creates a fetcher that retries transient failures per `policy`.
    pub fn with_retry(client: Option<Client>, policy: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = match client {
            Some(client) => client,
            None => Client::builder()
                .timeout(Duration::from_secs(10))
                .redirect(Policy::none())
                .build()?,
        };
        Ok(Self {
            client,
            retry: policy,
        })
    }

    async fn fetch_once(
        &self,
        cancel: &CancellationToken,
        url: &PageUrl,
    ) -> Result<reqwest::Response, FetchError> {
        let send = self.client.get(url.as_url().clone()).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = send => response,
        };

        response.map_err(|e| classify(url, e))
    }
}

fn classify(url: &PageUrl, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        url: &PageUrl,
    ) -> Result<FetchResult, FetchError> {
        let mut attempt = 0;
        loop {
            let outcome = self.fetch_redirecting(cancel, url).await;

            let retry = attempt < self.retry.max_retries
                && match &outcome {
                    Ok(result) => RetryPolicy::retryable_status(result.status),
                    Err(err) => RetryPolicy::retryable_error(err),
                };
            if !retry {
                return outcome;
            }

            let delay = self.retry.delay_for_attempt(attempt);
            tracing::debug!("retry attempt {} for {}, waiting {:?}", attempt + 1, url, delay);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

impl HttpFetcher {
    /// One fetch attempt, following redirects.
    async fn fetch_redirecting(
        &self,
        cancel: &CancellationToken,
        url: &PageUrl,
    ) -> Result<FetchResult, FetchError> {
        let mut current = url.clone();
        let mut chain = Vec::new();

        loop {
            let response = self.fetch_once(cancel, &current).await?;
            let status = response.status();

            if status.is_redirection() && chain.len() < MAX_REDIRECTS {
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                match location {
                    Some(location) => {
                        chain.push(Redirect {
                            url: current.to_string(),
                            status: status.as_u16(),
                        });
                        current =
                            current
                                .resolve(&location)
                                .map_err(|e| FetchError::BadRedirect {
                                    url: current.to_string(),
                                    message: e.to_string(),
                                })?;
                        tracing::debug!("following redirect to {}", current);
                        continue;
                    }
                    None => {
                        return Err(FetchError::BadRedirect {
                            url: current.to_string(),
                            message: "redirect response without Location header".to_string(),
                        });
                    }
                }
            }

            // Not a redirect, or the chain hit the cap: return what we have,
            // body fully buffered.
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                body = response.bytes() => body,
            };
            let body = body.map_err(|e| FetchError::Body {
                url: current.to_string(),
                source: e,
            })?;

            return Ok(FetchResult {
                status: status.as_u16(),
                body: body.to_vec(),
                redirect_chain: chain,
            });
        }
    }
}
