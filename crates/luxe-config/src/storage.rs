//! Artifact storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_dump_dir() -> PathBuf {
    PathBuf::from("./dumps")
}

/// Upload cap for restore archives: 100 MiB.
const fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding dump artifacts and restore scratch files.
    /// Also served read-only under `/dumps/`.
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dump_dir: default_dump_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}
