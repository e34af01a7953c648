use crate::url::{PageUrl, PathPatterns};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Main configuration structure for siterake
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the site to crawl
    pub url: String,

    /// Mirror output directory
    pub output: String,

    /// Worker pool size
    pub workers_count: usize,

    pub pages: PagesConfig,

    pub js: JsConfig,
}

/// Page selection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Seed paths, resolved against the base URL
    pub entrypoints: Vec<String>,

    /// Patterns whose bodies are not written but whose links are still
    /// harvested
    pub extract_only: Vec<String>,

    /// Patterns whose URLs are never fetched
    pub exclude: Vec<String>,
}

/// Headless-browser fetching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JsConfig {
    /// Use the browser fetcher instead of plain HTTP
    pub enabled: bool,

    /// Milliseconds after navigation before reading the DOM
    pub wait_for: u64,

    /// Maximum concurrent browser tabs
    pub max_tabs: usize,

    /// Path to the browser binary
    pub executable_path: String,

    /// WebDriver endpoint to connect to
    pub webdriver_url: String,

    /// Additional browser launch flags
    pub flags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            output: "dist/".to_string(),
            workers_count: 10,
            pages: PagesConfig::default(),
            js: JsConfig::default(),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            entrypoints: vec!["/".to_string()],
            extract_only: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            wait_for: 2000,
            max_tabs: 1,
            executable_path: String::new(),
            webdriver_url: "http://localhost:9515".to_string(),
            flags: Vec::new(),
        }
    }
}

impl Config {
    /// A starter configuration for a local development server, as written
    /// by `siterake init`.
    pub fn starter() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            ..Default::default()
        }
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Parses the configured base URL.
    pub fn base_url(&self) -> ConfigResult<PageUrl> {
        PageUrl::parse(&self.url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))
    }

    /// Exclude patterns as a matcher.
    pub fn exclude_patterns(&self) -> PathPatterns {
        PathPatterns::from_strings(&self.pages.exclude)
    }

    /// Extract-only patterns as a matcher.
    pub fn extract_only_patterns(&self) -> PathPatterns {
        PathPatterns::from_strings(&self.pages.extract_only)
    }

    /// Whether a URL may be fetched at all.
    pub fn is_url_allowed(&self, url: &PageUrl) -> bool {
        !self.exclude_patterns().match_any(url.path())
    }

    /// Whether a page's body should be skipped when writing the mirror.
    pub fn is_extract_only(&self, url: &PageUrl) -> bool {
        self.extract_only_patterns().match_any(url.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output, "dist/");
        assert_eq!(config.workers_count, 10);
        assert_eq!(config.pages.entrypoints, vec!["/".to_string()]);
        assert!(!config.js.enabled);
        assert_eq!(config.js.wait_for, 2000);
        assert_eq!(config.js.max_tabs, 1);
    }

    #[test]
    fn test_starter_round_trips() {
        let toml = Config::starter().to_toml().expect("serialize");
        let parsed: Config = toml::from_str(&toml).expect("parse");
        assert_eq!(parsed.url, "http://localhost:8000");
        assert_eq!(parsed.output, "dist/");
        assert_eq!(parsed.pages.entrypoints, vec!["/"]);
    }

    #[test]
    fn test_url_filtering() {
        let config = Config {
            url: "https://example.com".to_string(),
            pages: PagesConfig {
                exclude: vec!["/secret/**".to_string()],
                extract_only: vec!["/".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        let secret = PageUrl::parse("https://example.com/secret/plans").unwrap();
        let root = PageUrl::parse("https://example.com/").unwrap();
        let about = PageUrl::parse("https://example.com/about").unwrap();

        assert!(!config.is_url_allowed(&secret));
        assert!(config.is_url_allowed(&about));
        assert!(config.is_extract_only(&root));
        assert!(!config.is_extract_only(&about));
    }
}
