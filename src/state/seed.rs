use crate::state::entity::{Entity, RollingSeries};
use crate::state::snapshot::{EntitySnapshot, SnapshotError};

struct SeedRow {
    id: &'static str,
    name: &'static str,
    symbol: &'static str,
    image: &'static str,
    price: f64,
    change_1h: f64,
    change_24h: f64,
    change_7d: f64,
    market_cap: f64,
    volume_24h: f64,
    circulating_supply: f64,
    max_supply: Option<f64>,
}

// Placeholder figures shown until the feed delivers live prices.
const DEFAULT_ROWS: [SeedRow; 5] = [
    SeedRow {
        id: "bitcoin",
        name: "Bitcoin",
        symbol: "BTC",
        image: "/btc.png",
        price: 48_235.75,
        change_1h: 0.5,
        change_24h: 2.3,
        change_7d: 5.7,
        market_cap: 929_782_835_298.0,
        volume_24h: 28_735_982_735.0,
        circulating_supply: 19_283_726.0,
        max_supply: Some(21_000_000.0),
    },
    SeedRow {
        id: "ethereum",
        name: "Ethereum",
        symbol: "ETH",
        image: "/eth.png",
        price: 2_532.46,
        change_1h: -0.2,
        change_24h: 1.8,
        change_7d: -3.2,
        market_cap: 304_598_234_509.0,
        volume_24h: 14_536_982_342.0,
        circulating_supply: 120_293_847.0,
        max_supply: None,
    },
    SeedRow {
        id: "tether",
        name: "Tether",
        symbol: "USDT",
        image: "/teth.png",
        price: 1.0,
        change_1h: 0.01,
        change_24h: 0.05,
        change_7d: -0.02,
        market_cap: 83_547_239_583.0,
        volume_24h: 67_823_459_230.0,
        circulating_supply: 83_547_239_583.0,
        max_supply: None,
    },
    SeedRow {
        id: "bnb",
        name: "BNB",
        symbol: "BNB",
        image: "/bn.jpeg",
        price: 382.75,
        change_1h: 0.8,
        change_24h: -1.2,
        change_7d: 3.5,
        market_cap: 59_283_475_293.0,
        volume_24h: 1_983_247_593.0,
        circulating_supply: 154_932_651.0,
        max_supply: Some(200_000_000.0),
    },
    SeedRow {
        id: "solana",
        name: "Solana",
        symbol: "SOL",
        image: "/sol.png",
        price: 89.32,
        change_1h: 1.2,
        change_24h: 4.5,
        change_7d: 12.3,
        market_cap: 37_592_837_465.0,
        volume_24h: 2_938_475_632.0,
        circulating_supply: 420_837_465.0,
        max_supply: None,
    },
];

/// Snapshot used when no stored state is available. Every series starts as
/// `series_len` zeros.
pub fn default_snapshot(series_len: usize) -> Result<EntitySnapshot, SnapshotError> {
    let mut snapshot = EntitySnapshot::new(series_len)?;
    for (rank, row) in DEFAULT_ROWS.iter().enumerate() {
        snapshot.insert(Entity {
            id: row.id.to_string(),
            rank: rank as u32 + 1,
            name: row.name.to_string(),
            symbol: row.symbol.to_string(),
            image: row.image.to_string(),
            price: row.price,
            price_change_1h: row.change_1h,
            price_change_24h: row.change_24h,
            price_change_7d: row.change_7d,
            market_cap: row.market_cap,
            volume_24h: row.volume_24h,
            circulating_supply: row.circulating_supply,
            max_supply: row.max_supply,
            series: RollingSeries::filled(series_len, 0.0),
        })?;
    }
    Ok(snapshot)
}
