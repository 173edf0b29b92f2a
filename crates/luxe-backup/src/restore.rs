//! Destructive restore from an uploaded archive.
//!
//! ```text
//! RECEIVED ─▶ STAGED ─▶ DISPATCHED ─▶ CLEANED_UP ─▶ REINITIALIZED
//!    │           │            │
//!    └─ 400/413  └─ 400       └─ 500 (tool stderr)
//! ```
//!
//! The scratch file is removed on every path once it exists. The exclusive
//! handle lock is held from dispatch until the fresh handle is installed.

use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Local;
use futures::{Stream, StreamExt};
use luxe_config::{DatabaseConfig, LuxeConfig};
use luxe_core::{ArtifactFormat, RestoreResult, naming};
use luxe_db::ConnectionManager;
use tokio::io::AsyncWriteExt;

use crate::error::{BackupError, UploadError};
use crate::guard::RemoveOnDrop;
use crate::process::{ProcessRunner, run_checked};
use crate::tools::PgTools;

/// Replaces the database contents from an uploaded dump.
pub struct RestoreOrchestrator<R> {
    runner: Arc<R>,
    tools: PgTools,
    database: DatabaseConfig,
    scratch_dir: PathBuf,
    max_upload_bytes: u64,
    handle: ConnectionManager,
}

impl<R: ProcessRunner> RestoreOrchestrator<R> {
    pub fn new(runner: Arc<R>, config: &LuxeConfig, handle: ConnectionManager) -> Self {
        Self {
            runner,
            tools: PgTools::new(config.tools.clone()),
            database: config.database.clone(),
            scratch_dir: config.storage.dump_dir.clone(),
            max_upload_bytes: config.storage.max_upload_bytes,
            handle,
        }
    }

    #[must_use]
    pub const fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Stage `upload`, run the matching restore tool and reinitialize the
    /// shared handle.
    ///
    /// `original_filename` is the client-supplied name. Its suffix picks the
    /// tool; only its sanitized basename is used on disk.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unusable filename, an empty body, or a stream
    ///   that fails mid-upload
    /// - `PayloadTooLarge` once more than `max_upload_bytes` arrive, or when
    ///   the stream itself reports [`UploadError::TooLarge`]; nothing is
    ///   executed
    /// - `ExternalTool` with the tool's stderr if the restore fails
    /// - `PostRestoreReconnect` if the data was restored but no fresh
    ///   handle could be established
    pub async fn restore<S, E>(
        &self,
        upload: S,
        original_filename: &str,
    ) -> Result<RestoreResult, BackupError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<UploadError>,
    {
        let format = ArtifactFormat::from_filename(original_filename);
        let name = naming::sanitize_upload_name(original_filename).ok_or_else(|| {
            BackupError::Validation(format!("unusable upload filename {original_filename:?}"))
        })?;

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(BackupError::io("failed to create scratch directory"))?;

        let now = Local::now();
        let (scratch, _, file) = RemoveOnDrop::create_new(&self.scratch_dir, |seq| {
            naming::scratch_filename(&now, &name, seq)
        })
        .await
        .map_err(BackupError::io("failed to create scratch file"))?;
        let size_bytes = self.stage(upload, file).await?;

        tracing::info!(
            upload = original_filename,
            %format,
            size_bytes,
            "restore upload staged"
        );

        let mut exclusive = self.handle.lock_exclusive().await;
        let invocation = self.tools.restore(&self.database, format, scratch.path());
        let outcome = run_checked(self.runner.as_ref(), &invocation).await;
        scratch.remove();
        outcome?;

        exclusive
            .reinitialize(&self.database)
            .await
            .map_err(|error| {
                tracing::error!(%error, "database restored but the handle could not be reopened");
                BackupError::PostRestoreReconnect(error)
            })?;

        tracing::info!(%format, "database restored");
        Ok(RestoreResult::success())
    }

    async fn stage<S, E>(&self, upload: S, mut file: tokio::fs::File) -> Result<u64, BackupError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<UploadError>,
    {
        let mut upload = pin!(upload);
        let mut written: u64 = 0;

        while let Some(chunk) = upload.next().await {
            let chunk = chunk.map_err(|e| match e.into() {
                UploadError::TooLarge => BackupError::PayloadTooLarge {
                    limit_bytes: self.max_upload_bytes,
                },
                interrupted @ UploadError::Interrupted(_) => {
                    BackupError::Validation(interrupted.to_string())
                }
            })?;
            written += chunk.len() as u64;
            if written > self.max_upload_bytes {
                return Err(BackupError::PayloadTooLarge {
                    limit_bytes: self.max_upload_bytes,
                });
            }
            file.write_all(&chunk)
                .await
                .map_err(BackupError::io("failed to write scratch file"))?;
        }
        file.flush()
            .await
            .map_err(BackupError::io("failed to write scratch file"))?;

        if written == 0 {
            return Err(BackupError::Validation("uploaded file is empty".to_string()));
        }
        Ok(written)
    }
}
