//! Database handle error types for luxe-db.

use thiserror::Error;

/// Errors from acquiring, using or replacing the shared handle.
#[derive(Debug, Error)]
pub enum DbError {
    /// The handle was requested before the first successful initialization,
    /// or after a failed reinitialization left the slot empty.
    #[error("database handle is not initialized")]
    NotInitialized,

    /// A restore holds the handle exclusively.
    #[error("database restore in progress; retry shortly")]
    ServiceRestoring,

    /// A query reached a pool that had already been closed.
    #[error("database handle was closed while in use")]
    OperationOnClosedHandle,

    /// Connectivity verification never succeeded.
    #[error("could not reach database after {attempts} attempt(s): {last_error}")]
    Connection { attempts: u32, last_error: String },

    /// Connection settings could not be turned into pool options.
    #[error("invalid connection settings: {0}")]
    InvalidConfig(String),

    /// A query failed for a reason unrelated to the handle lifecycle.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolClosed => Self::OperationOnClosedHandle,
            other => Self::Query(other),
        }
    }
}
