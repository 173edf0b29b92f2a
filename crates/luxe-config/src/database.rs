//! PostgreSQL connection configuration.
//!
//! The same parameters drive both the shared connection pool and the
//! external `pg_dump` / `pg_restore` / `psql` invocations.

use std::fmt;

use serde::{Deserialize, Serialize};

fn default_host() -> String {
    String::from("db")
}

const fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    String::from("luxe")
}

fn default_password() -> String {
    String::from("luxe123")
}

fn default_name() -> String {
    String::from("luxe_db")
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_acquire_timeout_secs() -> u64 {
    5
}

/// Default number of connectivity checks after (re)opening the pool.
const fn default_connect_attempts() -> u32 {
    10
}

/// Default fixed delay between connectivity checks.
const fn default_connect_backoff_ms() -> u64 {
    2000
}

#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host", deserialize_with = "crate::lenient::string")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user", deserialize_with = "crate::lenient::string")]
    pub user: String,

    #[serde(
        default = "default_password",
        deserialize_with = "crate::lenient::string"
    )]
    pub password: String,

    /// Database name.
    #[serde(default = "default_name", deserialize_with = "crate::lenient::string")]
    pub name: String,

    /// Full connection URL (`postgres://...`). When set it replaces the
    /// individual fields for the pool; the external tools keep using them.
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            name: default_name(),
            url: String::new(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_ms: default_connect_backoff_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Whether a full connection URL overrides the individual fields.
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("url", &if self.has_url() { "<redacted>" } else { "" })
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("connect_attempts", &self.connect_attempts)
            .field("connect_backoff_ms", &self.connect_backoff_ms)
            .finish()
    }
}
