//! Siterake: a website mirroring and SEO auditing toolkit
//!
//! This crate implements a concurrent crawler that mirrors a site to disk,
//! rewrites absolute URLs inside the mirror to root-relative ones, and runs
//! a rule-based HTML linter over every crawled page.

pub mod analyzer;
pub mod config;
pub mod crawler;
pub mod exporter;
pub mod linter;
pub mod reporter;
pub mod rewriter;
pub mod serve;
pub mod url;

use thiserror::Error;

/// Main error type for siterake operations
#[derive(Debug, Error)]
pub enum SiterakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("crawl cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serve error: {0}")]
    Serve(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Cannot resolve {reference} against {base}: {message}")]
    Resolve {
        base: String,
        reference: String,
        message: String,
    },
}

/// Result type alias for siterake operations
pub type Result<T> = std::result::Result<T, SiterakeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, CrawlerConfig, Fetcher, HttpFetcher, Link, Page};
pub use url::{PageUrl, PathPattern, PathPatterns};
