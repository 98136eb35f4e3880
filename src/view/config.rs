use serde::{Deserialize, Serialize};

use crate::state::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Rank,
    Name,
    Symbol,
    Price,
    PriceChange1h,
    PriceChange24h,
    PriceChange7d,
    MarketCap,
    Volume24h,
    CirculatingSupply,
    MaxSupply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Row filter on the 24h change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    All,
    /// Strictly positive 24h change.
    Gainers,
    /// Strictly negative 24h change.
    Losers,
}

impl Filter {
    pub fn admits(&self, entity: &Entity) -> bool {
        match self {
            Filter::All => true,
            Filter::Gainers => entity.price_change_24h > 0.0,
            Filter::Losers => entity.price_change_24h < 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub filter: Filter,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort_key: SortKey::Rank,
            direction: SortDirection::Ascending,
            filter: Filter::All,
        }
    }
}

impl ViewConfig {
    /// Column-header behaviour: re-selecting the ascending key flips to
    /// descending, anything else sorts ascending by `key`.
    pub fn request_sort(&mut self, key: SortKey) {
        self.direction = if self.sort_key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.sort_key = key;
    }
}
