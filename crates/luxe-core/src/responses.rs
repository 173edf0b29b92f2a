//! Response bodies returned by the admin database endpoints.

use serde::{Deserialize, Serialize};

/// Outcome of offering an artifact to the shipper.
///
/// Transient: only `sent` reaches the dump response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentResult {
    pub sent: bool,
    pub error: Option<String>,
}

impl ShipmentResult {
    #[must_use]
    pub const fn sent() -> Self {
        Self {
            sent: true,
            error: None,
        }
    }

    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            sent: false,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            sent: false,
            error: Some(error.into()),
        }
    }
}

/// Body of `POST /admin/db/dump`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DumpResult {
    pub status: String,
    pub filename: String,
    /// Public retrieval path, `/dumps/<filename>`.
    pub path: String,
    /// Artifact length in bytes at response time.
    pub size: u64,
    pub telegram_sent: bool,
    #[serde(skip)]
    pub shipment: ShipmentResult,
}

impl DumpResult {
    #[must_use]
    pub fn success(filename: String, size: u64, shipment: ShipmentResult) -> Self {
        Self {
            status: "success".to_string(),
            path: format!("/dumps/{filename}"),
            filename,
            size,
            telegram_sent: shipment.sent,
            shipment,
        }
    }
}

/// Body of `POST /admin/db/restore`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestoreResult {
    pub status: String,
    pub message: String,
}

impl RestoreResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: "Database restored successfully".to_string(),
        }
    }
}
