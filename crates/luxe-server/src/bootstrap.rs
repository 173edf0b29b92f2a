use std::sync::Arc;

use anyhow::Context;
use luxe_backup::ProcessRunner;
use luxe_config::LuxeConfig;
use luxe_db::ConnectionManager;

use crate::cli::Cli;
use crate::state::AppState;

/// Load `.env`, then the layered configuration, then apply CLI overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<LuxeConfig> {
    let mut config = LuxeConfig::load_with_dotenv(cli.config.as_deref())
        .context("failed to load luxe configuration")?;
    if let Some(bind) = &cli.bind {
        config.server.bind.clone_from(bind);
    }
    Ok(config)
}

/// Open the shared handle (with retries) and wire both orchestrators.
pub async fn init_state<R: ProcessRunner>(
    config: &LuxeConfig,
    runner: R,
) -> anyhow::Result<AppState<R>> {
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.name,
        "connecting to database"
    );
    let handle = ConnectionManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    AppState::new(Arc::new(runner), config, handle).context("failed to build dump shipper")
}
