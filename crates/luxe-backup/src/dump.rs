//! `pg_dump` into a timestamped artifact, then best-effort shipping.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use luxe_config::{DatabaseConfig, LuxeConfig};
use luxe_core::{Artifact, DumpResult, ShipmentResult, naming};
use luxe_db::ConnectionManager;
use luxe_ship::{Shipment, TelegramShipper};

use crate::error::BackupError;
use crate::guard::RemoveOnDrop;
use crate::process::{ProcessRunner, run_checked};
use crate::tools::PgTools;

/// Produces custom-format dumps of the live database.
pub struct DumpOrchestrator<R> {
    runner: Arc<R>,
    tools: PgTools,
    database: DatabaseConfig,
    dump_dir: PathBuf,
    handle: ConnectionManager,
    shipper: TelegramShipper,
}

impl<R: ProcessRunner> DumpOrchestrator<R> {
    pub fn new(
        runner: Arc<R>,
        config: &LuxeConfig,
        handle: ConnectionManager,
        shipper: TelegramShipper,
    ) -> Self {
        Self {
            runner,
            tools: PgTools::new(config.tools.clone()),
            database: config.database.clone(),
            dump_dir: config.storage.dump_dir.clone(),
            handle,
            shipper,
        }
    }

    /// Dump the database to `<dump_dir>/dump_<timestamp>.dump`.
    ///
    /// A dump in the same second as an earlier one gets a `_<n>` suffix
    /// instead of replacing it.
    ///
    /// Holds a handle lease for the duration of `pg_dump`, so a restore
    /// cannot start underneath it. A failed run leaves no file behind.
    /// Shipping happens after the lease is released and never fails the
    /// dump; its outcome is reported through `telegram_sent`.
    ///
    /// # Errors
    ///
    /// - `Db(ServiceRestoring)` / `Db(NotInitialized)` if no lease is available
    /// - `Io` if the dump directory or file cannot be created
    /// - `ExternalTool` with the tool's stderr if `pg_dump` fails
    /// - `ArtifactWrite` if `pg_dump` exits cleanly without producing a file
    pub async fn create_dump(&self) -> Result<DumpResult, BackupError> {
        let lease = self.handle.acquire()?;

        tokio::fs::create_dir_all(&self.dump_dir)
            .await
            .map_err(BackupError::io("failed to create dump directory"))?;

        let now = Local::now();
        let (pending, filename, file) =
            RemoveOnDrop::create_new(&self.dump_dir, |seq| naming::dump_filename(&now, seq))
                .await
                .map_err(BackupError::io("failed to create dump file"))?;
        drop(file);

        let invocation = self.tools.dump(&self.database, pending.path());
        run_checked(self.runner.as_ref(), &invocation).await?;

        let size_bytes = match tokio::fs::metadata(pending.path()).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
            Ok(_) => return Err(BackupError::ArtifactWrite(format!("{filename} is empty"))),
            Err(error) => return Err(BackupError::ArtifactWrite(format!("{filename}: {error}"))),
        };
        let artifact = Artifact::new(filename, pending.keep(), size_bytes);
        drop(lease);

        tracing::info!(
            filename = %artifact.filename,
            size_bytes,
            "database dump created"
        );

        let shipment = self.offer(&artifact).await;
        Ok(DumpResult::success(artifact.filename, size_bytes, shipment))
    }

    async fn offer(&self, artifact: &Artifact) -> ShipmentResult {
        match self.shipper.ship(artifact).await {
            Ok(Shipment::Delivered) => ShipmentResult::sent(),
            Ok(Shipment::Skipped) => ShipmentResult::skipped(),
            Err(error) => {
                tracing::warn!(
                    filename = %artifact.filename,
                    %error,
                    "failed to ship dump; local copy kept"
                );
                ShipmentResult::failed(error.to_string())
            }
        }
    }
}
