//! # luxe-config
//!
//! Layered configuration loading for the Luxe backend using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LUXE_*` prefix, `__` as separator)
//! 2. Deployment variables inherited from the compose setup (`DB_HOST`,
//!    `POSTGRES_USER`, `TELEGRAM_BOT_TOKEN`, ...)
//! 3. An explicit config file, or `./luxe.toml`
//! 4. User-level `~/.config/luxe/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `LUXE_DATABASE__HOST` -> `database.host`,
//! `LUXE_TELEGRAM__CHAT_ID` -> `telegram.chat_id`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use luxe_config::LuxeConfig;
//!
//! let config = LuxeConfig::load_with_dotenv(None).expect("config");
//!
//! if config.telegram.is_configured() {
//!     println!("dumps will be shipped to chat {}", config.telegram.chat_id);
//! }
//! ```

mod database;
mod error;
mod lenient;
mod server;
mod storage;
mod telegram;
mod tools;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use telegram::TelegramConfig;
pub use tools::ToolsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables used by the docker-compose deployment,
/// mapped onto their config keys.
const DEPLOYMENT_ENV: &[(&str, &str)] = &[
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("POSTGRES_USER", "database.user"),
    ("POSTGRES_PASSWORD", "database.password"),
    ("POSTGRES_DB", "database.name"),
    ("DATABASE_URL", "database.url"),
    ("TELEGRAM_BOT_TOKEN", "telegram.bot_token"),
    ("TELEGRAM_CHAT_ID", "telegram.chat_id"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LuxeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl LuxeConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value fails
    /// validation.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], plus `ConfigError::Dotenv` when a `.env` file
    /// exists but cannot be read or parsed.
    pub fn load_with_dotenv(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            // A missing .env is the normal case in containers.
            Err(error) if error.not_found() => {}
            Err(error) => return Err(error.into()),
        }
        Self::load(config_file)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer extra providers.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = config_file.map_or_else(|| PathBuf::from("luxe.toml"), Path::to_path_buf);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment = figment.merge(Self::deployment_env());
        figment.merge(Env::prefixed("LUXE_").split("__"))
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.connect_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.connect_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.storage.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.max_upload_bytes".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.telegram.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telegram.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    fn deployment_env() -> Env {
        Env::raw().filter_map(|key| {
            DEPLOYMENT_ENV
                .iter()
                .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                .map(|(_, path)| (*path).into())
        })
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("luxe").join("config.toml"))
    }
}
