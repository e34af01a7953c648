use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "siterake.toml";

/// Loads and parses a configuration file from the given path.
///
/// The configuration is validated before being returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads `siterake.toml` from the working directory, falling back to the
/// defaults when the file does not exist. Validation is deferred to the
/// caller, which usually applies CLI overrides first.
pub fn load_config_or_default() -> Result<Config, ConfigError> {
    match std::fs::read_to_string(CONFIG_FILE) {
        Ok(content) => {
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(ConfigError::Io(e)),
    }
}
