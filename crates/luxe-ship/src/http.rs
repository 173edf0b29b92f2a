//! Response status handling for the upload endpoint.

use crate::error::ShipmentError;

/// Return the response unchanged on 2xx, otherwise
/// [`ShipmentError::Api`] with the status and response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ShipmentError> {
    if !resp.status().is_success() {
        return Err(ShipmentError::Api {
            status: resp.status().as_u16(),
            body: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}
