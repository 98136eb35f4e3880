use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("connection attempt timed out")]
    Timeout,
}

/// Opens connections to the upstream feed.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedConnection>, FeedError>;
}

/// One open, text-framed feed connection.
#[async_trait]
pub trait FeedConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError>;

    /// Next inbound text frame. `None` once the peer has closed the connection.
    async fn next_text(&mut self) -> Option<Result<String, FeedError>>;

    async fn close(&mut self);
}
