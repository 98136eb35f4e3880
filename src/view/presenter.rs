use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::Entity;

/// One display line per row, as a table renderer would show it.
pub fn format_row(entity: &Entity) -> String {
    let supply = match entity.supply_ratio() {
        Some(ratio) => format!(" ({:.0}% of max)", ratio * 100.0),
        None => String::new(),
    };
    format!(
        "#{} {} ({}) ${:.2} 1h {:+.2}% 24h {:+.2}% 7d {:+.2}% cap ${:.0} vol ${:.0} supply {:.0}{}",
        entity.rank,
        entity.name,
        entity.symbol,
        entity.price,
        entity.price_change_1h,
        entity.price_change_24h,
        entity.price_change_7d,
        entity.market_cap,
        entity.volume_24h,
        entity.circulating_supply,
        supply,
    )
}

/// Stand-in presentation layer: logs the derived view whenever it changes.
pub async fn run_log_presenter(
    mut rows: watch::Receiver<Arc<Vec<Entity>>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            res = rows.changed() => if res.is_err() { break },
        }
        let view = rows.borrow_and_update().clone();
        if let Some(top) = view.first() {
            info!(rows = view.len(), top = %top.id, price = top.price, "view updated");
        }
        for entity in view.iter() {
            debug!("{}", format_row(entity));
        }
    }
}
