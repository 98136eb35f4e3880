use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::state::{Entity, EntitySnapshot};
use crate::view::config::{Filter, SortDirection, SortKey, ViewConfig};

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_value(entity: &Entity, key: SortKey) -> Option<SortValue<'_>> {
    let number = match key {
        SortKey::Name => return Some(SortValue::Text(&entity.name)),
        SortKey::Symbol => return Some(SortValue::Text(&entity.symbol)),
        SortKey::Rank => f64::from(entity.rank),
        SortKey::Price => entity.price,
        SortKey::PriceChange1h => entity.price_change_1h,
        SortKey::PriceChange24h => entity.price_change_24h,
        SortKey::PriceChange7d => entity.price_change_7d,
        SortKey::MarketCap => entity.market_cap,
        SortKey::Volume24h => entity.volume_24h,
        SortKey::CirculatingSupply => entity.circulating_supply,
        SortKey::MaxSupply => entity.max_supply?,
    };
    // NaN has no place in the order; treat it like a missing value.
    (!number.is_nan()).then_some(SortValue::Number(number))
}

/// Orders two entities by `config`. A missing operand on either side makes
/// no decision for the pair.
fn compare(a: &Entity, b: &Entity, config: &ViewConfig) -> Ordering {
    let ordering = match (sort_value(a, config.sort_key), sort_value(b, config.sort_key)) {
        (Some(SortValue::Number(x)), Some(SortValue::Number(y))) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(SortValue::Text(x)), Some(SortValue::Text(y))) => x.cmp(y),
        _ => Ordering::Equal,
    };
    match config.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Stable insertion sort. `slice::sort_by` needs a total order, and a
/// comparator where missing values equal everything is not one.
fn stable_sort_by<T>(items: &mut [T], mut cmp: impl FnMut(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Sorted, filtered copy of the snapshot. The snapshot itself is not touched.
pub fn compute(snapshot: &EntitySnapshot, config: &ViewConfig) -> Vec<Entity> {
    let mut rows = snapshot.entities().to_vec();
    stable_sort_by(&mut rows, |a, b| compare(a, b, config));
    rows.retain(|entity| config.filter.admits(entity));
    rows
}

/// Keeps a derived view current as snapshots and configuration change.
///
/// Recomputation runs on its own task against one immutable snapshot
/// generation at a time, so it never overlaps a mutation.
pub struct ViewEngine {
    config: watch::Sender<ViewConfig>,
    rows: watch::Receiver<Arc<Vec<Entity>>>,
}

impl ViewEngine {
    pub fn spawn(snapshots: watch::Receiver<Arc<EntitySnapshot>>, config: ViewConfig) -> Self {
        let initial = compute(&snapshots.borrow(), &config);
        let (rows_tx, rows) = watch::channel(Arc::new(initial));
        let (config_tx, config_rx) = watch::channel(config);
        tokio::spawn(recompute_loop(snapshots, config_rx, rows_tx));
        Self {
            config: config_tx,
            rows,
        }
    }

    pub fn config(&self) -> ViewConfig {
        *self.config.borrow()
    }

    pub fn set_config(&self, config: ViewConfig) {
        self.config.send_replace(config);
    }

    pub fn request_sort(&self, key: SortKey) {
        self.config.send_modify(|config| config.request_sort(key));
    }

    pub fn set_filter(&self, filter: Filter) {
        self.config.send_modify(|config| config.filter = filter);
    }

    /// Receiver for the derived rows; changes on every recomputation.
    pub fn rows(&self) -> watch::Receiver<Arc<Vec<Entity>>> {
        self.rows.clone()
    }

    pub fn latest(&self) -> Arc<Vec<Entity>> {
        self.rows.borrow().clone()
    }
}

async fn recompute_loop(
    mut snapshots: watch::Receiver<Arc<EntitySnapshot>>,
    mut config: watch::Receiver<ViewConfig>,
    rows: watch::Sender<Arc<Vec<Entity>>>,
) {
    loop {
        tokio::select! {
            res = snapshots.changed() => if res.is_err() { break },
            res = config.changed() => if res.is_err() { break },
        }
        let snapshot = snapshots.borrow_and_update().clone();
        let current = *config.borrow_and_update();
        rows.send_replace(Arc::new(compute(&snapshot, &current)));
    }
    debug!("view engine inputs closed, stopping");
}
