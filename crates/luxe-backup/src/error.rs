//! Backup and restore error types.

use luxe_db::DbError;
use thiserror::Error;

/// Errors from dump and restore requests.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The upload is malformed, empty, or has an unusable filename.
    #[error("invalid upload: {0}")]
    Validation(String),

    /// The upload exceeded the configured cap. Nothing was executed.
    #[error("upload exceeds the {limit_bytes} byte limit")]
    PayloadTooLarge { limit_bytes: u64 },

    /// Directory or file handling failed.
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be started or exited unsuccessfully.
    /// `stderr` is the tool's captured standard error, verbatim.
    #[error("{tool} failed ({exit}): {stderr}")]
    ExternalTool {
        tool: String,
        exit: String,
        stderr: String,
    },

    /// The dump tool reported success but left no usable file.
    #[error("dump file was not created: {0}")]
    ArtifactWrite(String),

    /// The shared handle could not be leased (restore running, not ready).
    #[error(transparent)]
    Db(#[from] DbError),

    /// The data was restored but the fresh handle never came up.
    #[error("database restored but reconnect failed; restart the service: {0}")]
    PostRestoreReconnect(#[source] DbError),
}

/// Why an upload stream stopped before its end.
///
/// Transports map their own stream errors into this so a size limit they
/// enforce reaches the caller as `PayloadTooLarge`.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The transport's own size limit tripped mid-upload.
    #[error("upload exceeds the transport size limit")]
    TooLarge,

    /// The stream broke off.
    #[error("upload interrupted: {0}")]
    Interrupted(String),
}

impl From<std::io::Error> for UploadError {
    fn from(error: std::io::Error) -> Self {
        Self::Interrupted(error.to_string())
    }
}

impl BackupError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { context, source }
    }
}
