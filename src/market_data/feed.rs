use std::sync::Arc;
use tracing::{debug, info};

use crate::market_data::transport::{Connector, FeedConnection, FeedError};
use crate::market_data::types::SubscribeRequest;

/// Owns at most one connection to the feed endpoint.
pub struct FeedClient {
    connector: Arc<dyn Connector>,
    url: String,
    channels: Vec<String>,
    connection: Option<Box<dyn FeedConnection>>,
    next_request_id: u64,
}

impl FeedClient {
    pub fn new(connector: Arc<dyn Connector>, url: impl Into<String>, channels: Vec<String>) -> Self {
        Self {
            connector,
            url: url.into(),
            channels,
            connection: None,
            next_request_id: 1,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Opens the connection and subscribes to every channel.
    ///
    /// Returns `Ok(false)` without doing anything when a connection is
    /// already open. A failed subscription send drops the new connection.
    pub async fn connect(&mut self) -> Result<bool, FeedError> {
        if self.connection.is_some() {
            return Ok(false);
        }

        let mut connection = self.connector.connect(&self.url).await?;

        let id = self.next_request_id;
        self.next_request_id += 1;
        let request = serde_json::to_string(&SubscribeRequest::new(&self.channels, id))
            .map_err(|err| FeedError::Transport(err.to_string()))?;
        if let Err(err) = connection.send_text(request).await {
            connection.close().await;
            return Err(err);
        }

        info!(url = %self.url, channels = self.channels.len(), request_id = id, "subscribed to feed");
        self.connection = Some(connection);
        Ok(true)
    }

    /// Next inbound text frame. `None` when not connected or the peer closed.
    pub async fn next_frame(&mut self) -> Option<Result<String, FeedError>> {
        match self.connection.as_mut() {
            Some(connection) => connection.next_text().await,
            None => None,
        }
    }

    /// Closes the connection if one is open. Never schedules a reconnect.
    pub async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
            debug!(url = %self.url, "feed connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::testing::ScriptedConnector;

    fn client(connector: &Arc<ScriptedConnector>) -> FeedClient {
        FeedClient::new(
            connector.clone(),
            "wss://feed.test/ws",
            vec!["btcusdt@ticker".into(), "ethusdt@ticker".into()],
        )
    }

    #[tokio::test]
    async fn connect_sends_one_subscription() {
        let connector = ScriptedConnector::new();
        let _link = connector.push_open();
        let mut client = client(&connector);

        assert!(client.connect().await.unwrap());
        assert!(client.is_connected());

        let sent = connector.sent();
        assert_eq!(sent.len(), 1);
        let request: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(request["method"], "SUBSCRIBE");
        assert_eq!(request["params"], serde_json::json!(["btcusdt@ticker", "ethusdt@ticker"]));
        assert!(request["id"].is_u64());
    }

    #[tokio::test]
    async fn connect_while_connected_is_a_noop() {
        let connector = ScriptedConnector::new();
        let _link = connector.push_open();
        let mut client = client(&connector);

        client.connect().await.unwrap();
        assert!(!client.connect().await.unwrap());
        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.sent().len(), 1);
    }

    #[tokio::test]
    async fn refused_connection_surfaces_transport_error() {
        let connector = ScriptedConnector::new();
        let mut client = client(&connector);

        assert!(matches!(client.connect().await, Err(FeedError::Transport(_))));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn frames_are_delivered_until_close() {
        let connector = ScriptedConnector::new();
        let link = connector.push_open();
        let mut client = client(&connector);
        client.connect().await.unwrap();

        link.send("hello".to_string()).unwrap();
        drop(link);

        assert_eq!(client.next_frame().await.unwrap().unwrap(), "hello");
        assert!(client.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let connector = ScriptedConnector::new();
        let _link = connector.push_open();
        let mut client = client(&connector);
        client.connect().await.unwrap();

        client.disconnect().await;
        client.disconnect().await;

        assert!(!client.is_connected());
        assert_eq!(connector.closes(), 1);
        assert!(client.next_frame().await.is_none());
    }
}
