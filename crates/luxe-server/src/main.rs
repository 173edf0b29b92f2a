use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use luxe_backup::SystemRunner;

mod bootstrap;
mod cli;
mod config_warnings;
mod multipart;
mod reply;
mod routes;
mod server;
mod state;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("luxe error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = bootstrap::load_config(&cli)?;
    config_warnings::warn_unconfigured(&config);

    tokio::fs::create_dir_all(&config.storage.dump_dir)
        .await
        .with_context(|| {
            format!("failed to create dump directory {}", config.storage.dump_dir.display())
        })?;

    let state = Arc::new(bootstrap::init_state(&config, SystemRunner).await?);

    let http = Arc::new(
        tiny_http::Server::http(&config.server.bind)
            .map_err(|error| anyhow::anyhow!("failed to bind {}: {error}", config.server.bind))?,
    );
    tracing::info!(
        bind = %config.server.bind,
        dump_dir = %config.storage.dump_dir.display(),
        "luxe admin server listening"
    );

    let accept = {
        let http = Arc::clone(&http);
        let state = Arc::clone(&state);
        let runtime = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || server::serve(&http, &state, &runtime))
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested; no longer accepting requests");

    http.unblock();
    accept.await.context("accept loop panicked")?;
    state.handle.shutdown().await;
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LUXE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
