use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-length window of the most recent price observations, oldest first.
///
/// Pushing a new point evicts the oldest one, so the length chosen at
/// construction never changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollingSeries {
    points: VecDeque<f64>,
}

impl RollingSeries {
    /// Window of `len` copies of `value`. Used to pad before the first observation.
    pub fn filled(len: usize, value: f64) -> Self {
        Self {
            points: std::iter::repeat(value).take(len).collect(),
        }
    }

    pub fn push(&mut self, price: f64) {
        if self.points.is_empty() {
            return;
        }
        self.points.pop_front();
        self.points.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.points.back().copied()
    }

    /// Lowest point in the window, for chart scaling.
    pub fn min(&self) -> Option<f64> {
        self.iter().reduce(f64::min)
    }

    /// Highest point in the window, for chart scaling.
    pub fn max(&self) -> Option<f64> {
        self.iter().reduce(f64::max)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

/// One tracked instrument: display metadata, feed-driven scalars and the
/// locally maintained price window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub rank: u32,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub price: f64,
    pub price_change_1h: f64,
    pub price_change_24h: f64,
    pub price_change_7d: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub circulating_supply: f64,
    pub max_supply: Option<f64>,
    pub series: RollingSeries,
}

impl Entity {
    /// Circulating / max supply. Undefined without a positive max supply.
    pub fn supply_ratio(&self) -> Option<f64> {
        match self.max_supply {
            Some(max) if max > 0.0 => Some(self.circulating_supply / max),
            _ => None,
        }
    }
}
