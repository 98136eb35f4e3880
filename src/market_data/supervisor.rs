//! Self-healing feed link.
//!
//! `Disconnected → Connecting → Subscribed → Disconnected → (delay) → Connecting …`
//! until the caller stops it. The retry delay is fixed and attempts are
//! unbounded; see DESIGN.md for the hardening notes.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::market_data::feed::FeedClient;
use crate::market_data::ingest::Pipeline;
use crate::market_data::transport::{Connector, FeedError};
use crate::market_data::types::LinkState;
use crate::metrics;
use crate::state::EntitySnapshot;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<Pipeline>,
}

/// Owns the feed link's lifecycle and, between runs, the ingest pipeline.
///
/// While running, the pipeline lives inside the link task so every frame is
/// applied on that task alone. `disconnect` hands it back.
pub struct ReconnectSupervisor {
    connector: Arc<dyn Connector>,
    config: SupervisorConfig,
    link: Arc<watch::Sender<LinkState>>,
    snapshots: watch::Receiver<Arc<EntitySnapshot>>,
    idle: Option<Pipeline>,
    running: Option<Running>,
}

impl ReconnectSupervisor {
    pub fn new(connector: Arc<dyn Connector>, config: SupervisorConfig, pipeline: Pipeline) -> Self {
        let (link, _) = watch::channel(LinkState::Disconnected);
        Self {
            connector,
            config,
            link: Arc::new(link),
            snapshots: pipeline.subscribe(),
            idle: Some(pipeline),
            running: None,
        }
    }

    pub fn link_state(&self) -> watch::Receiver<LinkState> {
        self.link.subscribe()
    }

    /// Snapshot generations published by the pipeline, across runs.
    pub fn snapshots(&self) -> watch::Receiver<Arc<EntitySnapshot>> {
        self.snapshots.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Starts the link task. No-op while already running.
    pub fn connect(&mut self) {
        if self.running.is_some() {
            return;
        }
        let Some(pipeline) = self.idle.take() else {
            error!("feed pipeline was lost; cannot reconnect");
            return;
        };

        let client = FeedClient::new(
            self.connector.clone(),
            self.config.url.clone(),
            pipeline.resolver().channels(),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_link(
            client,
            pipeline,
            self.config.clone(),
            self.link.clone(),
            cancel.clone(),
        ));
        self.running = Some(Running { cancel, handle });
    }

    /// Tears the link down and cancels any pending reconnect.
    ///
    /// Once this returns no further update is applied until `connect` is
    /// called again. Idempotent.
    pub async fn disconnect(&mut self) {
        let Some(Running { cancel, handle }) = self.running.take() else {
            return;
        };
        cancel.cancel();
        match handle.await {
            Ok(pipeline) => self.idle = Some(pipeline),
            Err(err) => error!(error = %err, "feed link task failed"),
        }
        set_state(&self.link, LinkState::Stopped);
    }

    /// Resolves if the link task ends on its own, which only happens when it
    /// panics. Pends forever while the link is not running.
    pub async fn link_exited(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return std::future::pending().await;
        };
        let result = (&mut running.handle).await;
        self.running = None;
        match result {
            Ok(pipeline) => self.idle = Some(pipeline),
            Err(err) => error!(error = %err, "feed link task failed"),
        }
        set_state(&self.link, LinkState::Stopped);
    }
}

fn set_state(link: &watch::Sender<LinkState>, state: LinkState) {
    let previous = link.send_replace(state);
    if previous != state {
        info!(from = previous.as_str(), to = state.as_str(), "feed link state");
    }
    metrics::record_link_state(state.code());
}

enum LinkEvent {
    Stop,
    Frame(Option<Result<String, FeedError>>),
}

async fn run_link(
    mut client: FeedClient,
    mut pipeline: Pipeline,
    config: SupervisorConfig,
    link: Arc<watch::Sender<LinkState>>,
    cancel: CancellationToken,
) -> Pipeline {
    // Pending reconnect; only ever set while Disconnected.
    let mut reconnect: Option<Pin<Box<Sleep>>> = None;

    'link: loop {
        if let Some(timer) = reconnect.as_mut() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'link,
                _ = timer.as_mut() => {}
            }
            reconnect = None;
            metrics::record_reconnect();
        }

        if cancel.is_cancelled() {
            break 'link;
        }
        set_state(&link, LinkState::Connecting);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => break 'link,
            res = tokio::time::timeout(config.connect_timeout, client.connect()) => {
                res.unwrap_or(Err(FeedError::Timeout))
            }
        };

        match opened {
            Ok(_) => {
                set_state(&link, LinkState::Subscribed);
                loop {
                    let event = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => LinkEvent::Stop,
                        frame = client.next_frame() => LinkEvent::Frame(frame),
                    };
                    match event {
                        LinkEvent::Stop => break 'link,
                        LinkEvent::Frame(Some(Ok(text))) => {
                            pipeline.handle_frame(&text);
                        }
                        LinkEvent::Frame(Some(Err(err))) => {
                            warn!(error = %err, "feed transport error");
                            break;
                        }
                        LinkEvent::Frame(None) => {
                            warn!("feed connection closed by peer");
                            break;
                        }
                    }
                }
            }
            Err(err) => warn!(error = %err, url = %config.url, "feed connection failed"),
        }

        client.disconnect().await;
        set_state(&link, LinkState::Disconnected);
        info!(delay_ms = config.reconnect_delay.as_millis() as u64, "scheduling feed reconnect");
        reconnect = Some(Box::pin(tokio::time::sleep(config.reconnect_delay)));
    }

    drop(reconnect);
    client.disconnect().await;
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::symbols::SymbolResolver;
    use crate::market_data::testing::ScriptedConnector;
    use crate::market_data::types::Instrument;
    use crate::state::{seed, SnapshotStore};
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_secs(5);

    fn supervisor(connector: &Arc<ScriptedConnector>) -> ReconnectSupervisor {
        let resolver = SymbolResolver::new([
            Instrument::new("btcusdt", "bitcoin"),
            Instrument::new("ethusdt", "ethereum"),
        ]);
        let store = SnapshotStore::new(seed::default_snapshot(24).unwrap());
        ReconnectSupervisor::new(
            connector.clone(),
            SupervisorConfig {
                url: "wss://feed.test/ws".into(),
                reconnect_delay: DELAY,
                connect_timeout: Duration::from_secs(10),
            },
            Pipeline::new(resolver, store),
        )
    }

    async fn wait_for(link: &mut watch::Receiver<LinkState>, state: LinkState) {
        link.wait_for(|current| *current == state).await.unwrap();
    }

    fn btc_ticker(price: &str) -> String {
        format!(r#"{{"e":"24hrTicker","s":"BTCUSDT","c":"{price}","P":"2.5","v":"1"}}"#)
    }

    #[tokio::test(start_paused = true)]
    async fn subscribes_and_applies_frames() {
        let connector = ScriptedConnector::new();
        let feed = connector.push_open();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();
        let mut snapshots = supervisor.snapshots();

        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;
        assert_eq!(connector.sent().len(), 1);

        feed.send(btc_ticker("101")).unwrap();
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow().get("bitcoin").unwrap().price, 101.0);

        supervisor.disconnect().await;
        assert_eq!(*link.borrow(), LinkState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_one_delay_when_link_drops() {
        let connector = ScriptedConnector::new();
        let first = connector.push_open();
        let _second = connector.push_open();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();

        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;

        let dropped_at = Instant::now();
        drop(first);
        wait_for(&mut link, LinkState::Disconnected).await;
        wait_for(&mut link, LinkState::Subscribed).await;

        let attempts = connector.attempt_times();
        assert_eq!(attempts.len(), 2);
        let gap = attempts[1] - dropped_at;
        assert!(gap >= DELAY, "reconnected too early: {gap:?}");
        assert!(gap < DELAY + Duration::from_millis(50), "reconnected too late: {gap:?}");
        // fresh subscription on the new connection
        assert_eq!(connector.sent().len(), 2);

        supervisor.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_delay_cancels_reconnect() {
        let connector = ScriptedConnector::new();
        let first = connector.push_open();
        let _second = connector.push_open();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();

        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;
        drop(first);
        wait_for(&mut link, LinkState::Disconnected).await;

        tokio::time::sleep(DELAY / 2).await;
        supervisor.disconnect().await;
        assert_eq!(*link.borrow(), LinkState::Stopped);

        tokio::time::sleep(DELAY * 10).await;
        assert_eq!(connector.attempts(), 1);
        assert_eq!(*link.borrow(), LinkState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_as_delay_expires_makes_no_attempt() {
        let connector = ScriptedConnector::new();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();

        supervisor.connect();
        tokio::time::sleep(DELAY / 2).await;
        assert_eq!(connector.attempts(), 1);

        tokio::time::advance(DELAY / 2).await;
        let before = connector.attempts();
        supervisor.disconnect().await;
        assert_eq!(*link.borrow_and_update(), LinkState::Stopped);

        tokio::time::sleep(DELAY * 10).await;
        assert_eq!(connector.attempts(), before);
        assert_eq!(*link.borrow(), LinkState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frames_keep_the_link_up() {
        let connector = ScriptedConnector::new();
        let feed = connector.push_open();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();
        let mut snapshots = supervisor.snapshots();

        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;

        feed.send("{".to_string()).unwrap();
        feed.send(r#"{"e":"24hrTicker","s":"BTCUSDT","c":7,"P":"1","v":"1"}"#.to_string())
            .unwrap();
        feed.send(btc_ticker("102")).unwrap();
        snapshots.changed().await.unwrap();

        assert_eq!(*link.borrow(), LinkState::Subscribed);
        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.closes(), 0);
        let bitcoin = snapshots.borrow().get("bitcoin").unwrap().clone();
        assert_eq!(bitcoin.price, 102.0);
        assert_eq!(bitcoin.series.latest(), Some(102.0));

        supervisor.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_link_task_is_reported() {
        struct PanickingConnector;

        #[async_trait::async_trait]
        impl Connector for PanickingConnector {
            async fn connect(
                &self,
                _url: &str,
            ) -> Result<Box<dyn crate::market_data::transport::FeedConnection>, FeedError> {
                panic!("connector blew up");
            }
        }

        let resolver = SymbolResolver::new([Instrument::new("btcusdt", "bitcoin")]);
        let store = SnapshotStore::new(seed::default_snapshot(24).unwrap());
        let mut supervisor = ReconnectSupervisor::new(
            Arc::new(PanickingConnector),
            SupervisorConfig {
                url: "wss://feed.test/ws".into(),
                reconnect_delay: DELAY,
                connect_timeout: Duration::from_secs(10),
            },
            Pipeline::new(resolver, store),
        );
        let link = supervisor.link_state();

        supervisor.connect();
        supervisor.link_exited().await;

        assert!(!supervisor.is_running());
        assert_eq!(*link.borrow(), LinkState::Stopped);
        supervisor.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connection_is_retried() {
        let connector = ScriptedConnector::new();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();

        supervisor.connect();
        tokio::time::sleep(DELAY / 2).await;
        assert_eq!(connector.attempts(), 1);
        assert_eq!(*link.borrow(), LinkState::Disconnected);
        let _feed = connector.push_open();
        wait_for(&mut link, LinkState::Subscribed).await;

        assert_eq!(connector.attempts(), 2);
        supervisor.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_disconnect_does_not_reconnect() {
        let connector = ScriptedConnector::new();
        let _first = connector.push_open();
        let _second = connector.push_open();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();

        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;
        supervisor.disconnect().await;
        supervisor.disconnect().await;

        tokio::time::sleep(DELAY * 10).await;
        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.closes(), 1);
        assert!(!supervisor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn connect_is_idempotent_and_restart_keeps_state() {
        let connector = ScriptedConnector::new();
        let first = connector.push_open();
        let second = connector.push_open();
        let mut supervisor = supervisor(&connector);
        let mut link = supervisor.link_state();
        let mut snapshots = supervisor.snapshots();

        supervisor.connect();
        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;
        assert_eq!(connector.attempts(), 1);

        first.send(btc_ticker("200")).unwrap();
        snapshots.changed().await.unwrap();
        supervisor.disconnect().await;

        supervisor.connect();
        wait_for(&mut link, LinkState::Subscribed).await;
        second.send(btc_ticker("201")).unwrap();
        snapshots.changed().await.unwrap();

        let series = snapshots.borrow().get("bitcoin").unwrap().series.to_vec();
        assert_eq!(&series[22..], &[200.0, 201.0]);
        supervisor.disconnect().await;
    }
}
