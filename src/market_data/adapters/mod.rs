pub mod binance;

pub use binance::{WsConnector, BINANCE_WS_URL, DEFAULT_INSTRUMENTS};
