//! # luxe-backup
//!
//! Dump and restore orchestration around the PostgreSQL client tools.
//!
//! - [`DumpOrchestrator`] runs `pg_dump -F c` into a timestamped artifact and
//!   offers it to the Telegram shipper. Shipping never fails the dump.
//! - [`RestoreOrchestrator`] stages an uploaded archive, picks `psql` or
//!   `pg_restore --clean` by filename suffix, always removes the scratch file,
//!   and reinitializes the shared database handle afterwards.
//!
//! Subprocesses go through the [`ProcessRunner`] capability so tests can
//! substitute a fake without spawning anything.

pub mod dump;
pub mod error;
mod guard;
pub mod process;
pub mod restore;
pub mod tools;

pub use dump::DumpOrchestrator;
pub use error::{BackupError, UploadError};
pub use process::{ProcessRunner, SystemRunner, ToolInvocation, ToolOutput};
pub use restore::RestoreOrchestrator;
pub use tools::PgTools;
