use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::market_data::transport::{Connector, FeedConnection, FeedError};

/// Binance raw-stream endpoint; channels are added with a SUBSCRIBE request.
pub const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// Default instruments: wire symbol → entity id.
pub const DEFAULT_INSTRUMENTS: &[(&str, &str)] = &[
    ("btcusdt", "bitcoin"),
    ("ethusdt", "ethereum"),
    ("xrpusdt", "xrp"),
    ("bnbusdt", "bnb"),
    ("solusdt", "solana"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn FeedConnection>, FeedError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|err| FeedError::Transport(err.to_string()))?;
        debug!(status = %response.status(), url, "websocket handshake complete");
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|err| FeedError::Transport(err.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, FeedError>> {
        // Pings are answered by tungstenite on the next read/write.
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "feed sent close frame");
                    return None;
                }
                Ok(_) => continue,
                Err(err) => return Some(Err(FeedError::Transport(err.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(error = %err, "error while closing feed connection");
        }
    }
}
