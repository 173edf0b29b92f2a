//! Shipment error types.

use thiserror::Error;

/// Errors delivering an artifact. Never fatal to the dump that produced it.
#[derive(Debug, Error)]
pub enum ShipmentError {
    /// HTTP transport error, including the request timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Telegram API error ({status}): {body}")]
    Api {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The artifact could not be read.
    #[error("artifact read failed: {0}")]
    Io(#[from] std::io::Error),
}
