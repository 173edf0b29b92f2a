//! # luxe-ship
//!
//! Best-effort delivery of finished dump artifacts to a Telegram chat via
//! the Bot API `sendDocument` method.
//!
//! Shipping is opt-in: without a bot token and chat id, [`TelegramShipper::ship`]
//! succeeds with [`Shipment::Skipped`] and makes no network call. Callers treat
//! every [`ShipmentError`] as non-fatal.

mod error;
mod http;

pub use error::ShipmentError;

use std::time::Duration;

use luxe_config::TelegramConfig;
use luxe_core::Artifact;
use reqwest::multipart::{Form, Part};

use crate::http::check_response;

/// What happened to an artifact offered for shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shipment {
    Delivered,
    /// Destination credentials are not configured.
    Skipped,
}

/// Uploads dump artifacts as Telegram documents.
pub struct TelegramShipper {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramShipper {
    /// Build a shipper with a client bounded by `config.timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentError::Http` if the HTTP client cannot be built.
    pub fn new(config: TelegramConfig) -> Result<Self, ShipmentError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("luxe-backup/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Send `artifact` to the configured chat.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError`] if the file cannot be read, the request
    /// fails or times out, or the API answers with a non-success status.
    pub async fn ship(&self, artifact: &Artifact) -> Result<Shipment, ShipmentError> {
        if !self.config.is_configured() {
            tracing::debug!(
                filename = %artifact.filename,
                "telegram not configured; skipping shipment"
            );
            return Ok(Shipment::Skipped);
        }

        let bytes = tokio::fs::read(&artifact.path).await?;
        let document = Part::bytes(bytes)
            .file_name(artifact.filename.clone())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption(artifact))
            .part("document", document);

        let resp = self
            .http
            .post(self.config.send_document_url())
            .multipart(form)
            .send()
            .await?;
        check_response(resp).await?;

        tracing::info!(
            filename = %artifact.filename,
            size_bytes = artifact.size_bytes,
            "dump shipped to telegram"
        );
        Ok(Shipment::Delivered)
    }
}

/// Human-readable caption attached to the document.
#[must_use]
pub fn caption(artifact: &Artifact) -> String {
    format!(
        "Database dump: {}\nSize: {:.2} MB",
        artifact.filename,
        artifact.size_mb()
    )
}
