//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

fn default_bind() -> String {
    String::from("0.0.0.0:8080")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address for the admin HTTP server.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}
