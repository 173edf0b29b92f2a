//! # luxe-db
//!
//! Ownership of the single shared PostgreSQL handle.
//!
//! The backend keeps exactly one live `PgPool`. Request paths borrow it
//! through a [`HandleLease`]; a restore takes an [`ExclusiveHandle`] that
//! waits for outstanding leases, turns new acquirers away with
//! [`DbError::ServiceRestoring`], and swaps in a freshly verified pool once
//! the database contents have been replaced.

pub mod error;
mod manager;
pub mod retry;

pub use error::DbError;
pub use manager::{
    ConnectionManager, Connector, ExclusiveHandle, HandleLease, HandleState, connect_options,
};
pub use retry::ConnectSchedule;
pub use sqlx::PgPool;
