//! Inbound frame decoding.
//!
//! Only `24hrTicker` frames carry state. Anything else (subscription acks,
//! other event types) is ignored without error.

use serde::Deserialize;
use thiserror::Error;

const TICKER_EVENT: &str = "24hrTicker";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ticker frame missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a finite number: {value:?}")]
    BadNumber { field: &'static str, value: String },
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    #[serde(rename = "s")]
    symbol: Option<String>,
    #[serde(rename = "c")]
    last_price: Option<String>,
    #[serde(rename = "P")]
    change_pct: Option<String>,
    #[serde(rename = "v")]
    base_volume: Option<String>,
}

/// Decoded 24h rolling-window ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: f64,
    pub change_24h_pct: f64,
    pub base_volume: f64,
}

impl Ticker {
    /// 24h volume in the quote asset.
    pub fn quote_volume(&self) -> f64 {
        self.base_volume * self.last_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Ticker(Ticker),
    Ignored,
}

pub fn decode(text: &str) -> Result<Decoded, DecodeError> {
    let frame: serde_json::Value = serde_json::from_str(text)?;
    if frame.get("e").and_then(serde_json::Value::as_str) != Some(TICKER_EVENT) {
        return Ok(Decoded::Ignored);
    }

    let raw: RawTicker = serde_json::from_value(frame)?;
    let symbol = raw.symbol.ok_or(DecodeError::MissingField("s"))?;
    let ticker = Ticker {
        symbol,
        last_price: number("c", raw.last_price)?,
        change_24h_pct: number("P", raw.change_pct)?,
        base_volume: number("v", raw.base_volume.clone())?,
    };
    if !ticker.quote_volume().is_finite() {
        return Err(DecodeError::BadNumber {
            field: "v",
            value: raw.base_volume.unwrap_or_default(),
        });
    }
    Ok(Decoded::Ticker(ticker))
}

fn number(field: &'static str, value: Option<String>) -> Result<f64, DecodeError> {
    let value = value.ok_or(DecodeError::MissingField(field))?;
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(DecodeError::BadNumber { field, value }),
    }
}
