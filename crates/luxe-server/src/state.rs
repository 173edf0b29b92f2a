use std::path::PathBuf;
use std::sync::Arc;

use luxe_backup::{DumpOrchestrator, ProcessRunner, RestoreOrchestrator};
use luxe_config::LuxeConfig;
use luxe_db::ConnectionManager;
use luxe_ship::{ShipmentError, TelegramShipper};

/// Everything a request handler needs, shared across worker threads.
pub struct AppState<R> {
    pub dump: DumpOrchestrator<R>,
    pub restore: RestoreOrchestrator<R>,
    pub handle: ConnectionManager,
    pub dump_dir: PathBuf,
}

impl<R: ProcessRunner> AppState<R> {
    /// # Errors
    ///
    /// Returns `ShipmentError::Http` if the shipping client cannot be built.
    pub fn new(
        runner: Arc<R>,
        config: &LuxeConfig,
        handle: ConnectionManager,
    ) -> Result<Self, ShipmentError> {
        let shipper = TelegramShipper::new(config.telegram.clone())?;
        if shipper.is_configured() {
            tracing::info!("telegram shipping enabled");
        }

        Ok(Self {
            dump: DumpOrchestrator::new(Arc::clone(&runner), config, handle.clone(), shipper),
            restore: RestoreOrchestrator::new(runner, config, handle.clone()),
            handle,
            dump_dir: config.storage.dump_dir.clone(),
        })
    }
}
