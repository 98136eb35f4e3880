use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticker_engine::config::Config;
use ticker_engine::market_data::adapters::WsConnector;
use ticker_engine::market_data::{Pipeline, ReconnectSupervisor, SymbolResolver};
use ticker_engine::persist::{run_persister, SnapshotFile};
use ticker_engine::state::{seed, SnapshotStore};
use ticker_engine::view::presenter::run_log_presenter;
use ticker_engine::view::{ViewConfig, ViewEngine};

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!(url = %config.feed_url, instruments = config.instruments.len(), "ticker-engine starting");

    if config.metrics_port != 0 {
        ticker_engine::metrics::init_metrics_server(config.metrics_port)?;
    }

    let file = SnapshotFile::new(&config.snapshot_path);
    if config.reset_snapshot {
        file.clear()?;
    }
    let snapshot = match file.load(config.series_len) {
        Some(stored) => {
            info!(path = %file.path().display(), "seeded from stored snapshot");
            stored
        }
        None => seed::default_snapshot(config.series_len)?,
    };

    let store = SnapshotStore::new(snapshot);
    let snapshots = store.subscribe();
    let pipeline = Pipeline::new(SymbolResolver::new(config.instruments.clone()), store);
    let mut supervisor =
        ReconnectSupervisor::new(Arc::new(WsConnector), config.supervisor(), pipeline);

    let view = ViewEngine::spawn(snapshots.clone(), ViewConfig::default());
    let cancel = CancellationToken::new();
    let mut persister = tokio::spawn(run_persister(
        file,
        snapshots,
        config.persist_interval,
        cancel.clone(),
    ));
    let mut presenter = tokio::spawn(run_log_presenter(view.rows(), cancel.clone()));

    supervisor.connect();

    tokio::select! {
        res = &mut persister => {
            if let Err(err) = res {
                warn!(error = %err, "persister task panicked");
            }
        }
        res = &mut presenter => {
            if let Err(err) = res {
                warn!(error = %err, "presenter task panicked");
            }
        }
        _ = supervisor.link_exited() => {
            warn!("feed link task exited unexpectedly");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                warn!(error = %err, "failed to listen for Ctrl-C");
            }
            info!("received Ctrl-C, shutting down");
        }
    }

    supervisor.disconnect().await;
    cancel.cancel();
    for (name, handle) in [("persister", persister), ("presenter", presenter)] {
        if handle.is_finished() {
            continue;
        }
        if let Err(err) = handle.await {
            warn!(task = name, error = %err, "task did not shut down cleanly");
        }
    }

    Ok(())
}
