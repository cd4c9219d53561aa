mod cli;
mod sync;

use clap::Parser;
use grafana_sync_core::GrafanaClient;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};
use crate::sync::engine::SyncEngine;
use crate::sync::store::LocalStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let client = GrafanaClient::new(&cli.address, cli.auth())?.with_verbose(cli.verbose);
    let store = LocalStore::new(cli.directory.clone());
    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let engine = SyncEngine::new(client, store, cancel);
    match cli.command {
        Command::Pull { sync_folders } => {
            let pulled = engine.pull(&sync_folders).await?;
            eprintln!("[grafana-sync] pulled {pulled} dashboards");
        }
        Command::Push { datasource } => {
            let datasource = datasource.filter(|name| !name.is_empty());
            let pushed = engine.push(datasource.as_deref()).await?;
            eprintln!("[grafana-sync] pushed {pushed} dashboards");
        }
    }

    Ok(())
}

fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown().await;
        eprintln!("[grafana-sync] interrupted, finishing up");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut terminate) = signal(SignalKind::terminate()) else {
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
