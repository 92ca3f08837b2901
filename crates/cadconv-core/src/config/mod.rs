//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from an
//! optional TOML file merged with `CADCONV__`-prefixed environment variables.
//! Every field has a default, so running without any configuration works.

pub mod kernel;
pub mod logging;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::kernel::{KernelBackend, KernelConfig};
pub use self::logging::LoggingConfig;

use crate::result::AppResult;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cadconv";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CADCONV";

/// Root application configuration.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Geometry kernel settings.
    #[validate(nested)]
    pub kernel: KernelConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// With `path` set, that file must exist. Without it, `cadconv.toml` in
    /// the working directory is used when present. Environment variables such
    /// as `CADCONV__KERNEL__BACKEND=native` override file values.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let builder = config::Config::builder();
        let builder = match path {
            Some(p) => builder.add_source(config::File::from(p).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;

        app.validate()?;
        Ok(app)
    }
}
