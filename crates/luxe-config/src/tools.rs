//! External PostgreSQL client tool locations.

use serde::{Deserialize, Serialize};

fn default_pg_dump() -> String {
    String::from("pg_dump")
}

fn default_pg_restore() -> String {
    String::from("pg_restore")
}

fn default_psql() -> String {
    String::from("psql")
}

/// Program names or absolute paths, resolved through `PATH` when bare.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_pg_dump")]
    pub pg_dump: String,

    #[serde(default = "default_pg_restore")]
    pub pg_restore: String,

    #[serde(default = "default_psql")]
    pub psql: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pg_dump: default_pg_dump(),
            pg_restore: default_pg_restore(),
            psql: default_psql(),
        }
    }
}
