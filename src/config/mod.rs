use anyhow::{Context, bail};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::market_data::adapters::{BINANCE_WS_URL, DEFAULT_INSTRUMENTS};
use crate::market_data::supervisor::SupervisorConfig;
use crate::market_data::types::Instrument;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub feed_url: String,
    pub instruments: Vec<Instrument>,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub series_len: usize,
    pub snapshot_path: PathBuf,
    pub persist_interval: Duration,
    /// `0` disables the Prometheus exporter.
    pub metrics_port: u16,
    pub reset_snapshot: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let feed_url = lookup("FEED_URL").unwrap_or_else(|| BINANCE_WS_URL.to_string());

        let instruments = match lookup("FEED_INSTRUMENTS") {
            Some(raw) => parse_instruments(&raw)?,
            None => DEFAULT_INSTRUMENTS
                .iter()
                .map(|(symbol, id)| Instrument::new(symbol, id))
                .collect(),
        };

        let series_len: usize = parse_or(&lookup, "SERIES_LEN", 24)?;
        if series_len == 0 {
            bail!("SERIES_LEN must be at least 1");
        }

        Ok(Self {
            log_level,
            feed_url,
            instruments,
            reconnect_delay: Duration::from_millis(parse_or(&lookup, "RECONNECT_DELAY_MS", 5_000)?),
            connect_timeout: Duration::from_millis(parse_or(&lookup, "CONNECT_TIMEOUT_MS", 10_000)?),
            series_len,
            snapshot_path: lookup("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ticker-snapshot.json")),
            persist_interval: Duration::from_millis(parse_or(&lookup, "PERSIST_INTERVAL_MS", 1_000)?),
            metrics_port: parse_or(&lookup, "METRICS_PORT", 9_000)?,
            reset_snapshot: parse_or(&lookup, "RESET_SNAPSHOT", false)?,
        })
    }

    pub fn supervisor(&self) -> SupervisorConfig {
        SupervisorConfig {
            url: self.feed_url.clone(),
            reconnect_delay: self.reconnect_delay,
            connect_timeout: self.connect_timeout,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// `btcusdt=bitcoin,ethusdt=ethereum`
fn parse_instruments(raw: &str) -> anyhow::Result<Vec<Instrument>> {
    let mut instruments = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let Some((symbol, id)) = pair.split_once('=') else {
            bail!("invalid FEED_INSTRUMENTS entry {pair:?}, expected symbol=entity");
        };
        if symbol.trim().is_empty() || id.trim().is_empty() {
            bail!("invalid FEED_INSTRUMENTS entry {pair:?}, expected symbol=entity");
        }
        instruments.push(Instrument::new(symbol, id));
    }
    if instruments.is_empty() {
        bail!("FEED_INSTRUMENTS is empty");
    }
    Ok(instruments)
}
