use serde::Serialize;

/// A feed instrument and the entity it updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Lowercase wire symbol, e.g. `btcusdt`.
    pub wire_symbol: String,
    pub entity_id: String,
}

impl Instrument {
    pub fn new(wire_symbol: &str, entity_id: &str) -> Self {
        Self {
            wire_symbol: wire_symbol.trim().to_ascii_lowercase(),
            entity_id: entity_id.trim().to_string(),
        }
    }

    /// Stream name used in the subscription request.
    pub fn channel(&self) -> String {
        format!("{}@ticker", self.wire_symbol)
    }
}

/// Sparse change to one entity. Absent fields leave the entity untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialUpdate {
    pub entity_id: String,
    pub price: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    /// Point to append to the rolling series. Falls back to `price` when unset.
    pub series_point: Option<f64>,
}

impl PartialUpdate {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_change_24h(mut self, change: f64) -> Self {
        self.price_change_24h = Some(change);
        self
    }

    pub fn with_volume_24h(mut self, volume: f64) -> Self {
        self.volume_24h = Some(volume);
        self
    }

    pub fn with_series_point(mut self, point: f64) -> Self {
        self.series_point = Some(point);
        self
    }

    /// Price observation carried by this update, if any.
    pub fn observation(&self) -> Option<f64> {
        self.series_point.or(self.price)
    }
}

/// Outbound subscription request.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest<'a> {
    pub method: &'static str,
    pub params: &'a [String],
    pub id: u64,
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(params: &'a [String], id: u64) -> Self {
        Self {
            method: "SUBSCRIBE",
            params,
            id,
        }
    }
}

/// Phase of the supervised feed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Subscribed,
    Stopped,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Subscribed => "subscribed",
            LinkState::Stopped => "stopped",
        }
    }

    /// Numeric code exported as the `feed_link_state` gauge.
    pub fn code(&self) -> f64 {
        match self {
            LinkState::Stopped => 0.0,
            LinkState::Disconnected => 1.0,
            LinkState::Connecting => 2.0,
            LinkState::Subscribed => 3.0,
        }
    }
}
