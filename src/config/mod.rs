//! Configuration loading and validation
//!
//! Configuration comes from `siterake.toml` in the working directory, with
//! every CLI flag able to override it. A missing file falls back to the
//! defaults; a file that fails to parse or validate is fatal before the
//! crawl starts.

mod parser;
mod types;
mod validation;

pub use parser::{load_config, load_config_or_default, CONFIG_FILE};
pub use types::{Config, JsConfig, PagesConfig};
pub use validation::validate;
