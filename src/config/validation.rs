use crate::config::types::Config;
use crate::ConfigError;

/// Validates a configuration before the crawl starts.
///
/// Failures here are fatal; nothing is fetched with a bad config.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "url is required (set it in siterake.toml or pass it on the command line)".to_string(),
        ));
    }

    let base = config.base_url()?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url must use http or https, got {}",
            base.scheme()
        )));
    }
    if base.hostname().is_empty() {
        return Err(ConfigError::Validation("url must have a host".to_string()));
    }

    if config.workers_count < 1 {
        return Err(ConfigError::Validation(
            "workers_count must be at least 1".to_string(),
        ));
    }

    if config.js.enabled && config.js.max_tabs < 1 {
        return Err(ConfigError::Validation(
            "js.max_tabs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            url: "https://example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_url() {
        let config = Config::default();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_scheme() {
        let mut config = valid_config();
        config.url = "ftp://example.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = valid_config();
        config.workers_count = 0;
        assert!(validate(&config).is_err());
    }
}
