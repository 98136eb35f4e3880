//! In-memory connector for exercising the feed without a network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::market_data::transport::{Connector, FeedConnection, FeedError};

#[derive(Default)]
struct Log {
    scripts: VecDeque<mpsc::UnboundedReceiver<String>>,
    attempts: Vec<Instant>,
    sent: Vec<String>,
    closes: usize,
}

/// Each `connect` consumes one scripted link pushed with [`push_open`];
/// with none queued the connection is refused.
///
/// [`push_open`]: ScriptedConnector::push_open
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    log: Arc<Mutex<Log>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues an accepting link. Frames sent on the returned sender arrive
    /// in order; dropping it closes the connection from the feed side.
    pub(crate) fn push_open(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.log.lock().unwrap().scripts.push_back(rx);
        tx
    }

    pub(crate) fn attempts(&self) -> usize {
        self.log.lock().unwrap().attempts.len()
    }

    pub(crate) fn attempt_times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().attempts.clone()
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.log.lock().unwrap().sent.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn FeedConnection>, FeedError> {
        let mut log = self.log.lock().unwrap();
        log.attempts.push(Instant::now());
        match log.scripts.pop_front() {
            Some(frames) => Ok(Box::new(ScriptedConnection {
                frames,
                log: self.log.clone(),
            })),
            None => Err(FeedError::Transport("connection refused".into())),
        }
    }
}

struct ScriptedConnection {
    frames: mpsc::UnboundedReceiver<String>,
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl FeedConnection for ScriptedConnection {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        self.log.lock().unwrap().sent.push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, FeedError>> {
        self.frames.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().closes += 1;
        self.frames.close();
    }
}
