use std::sync::Arc;
use tokio::sync::watch;
use tracing::{trace, warn};

use crate::market_data::decode::{self, Decoded};
use crate::market_data::symbols::SymbolResolver;
use crate::market_data::types::PartialUpdate;
use crate::metrics;
use crate::state::{ApplyOutcome, EntitySnapshot, SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Applied,
    Ignored,
    UnknownSymbol,
    UnknownEntity,
    Malformed,
}

/// Decode → resolve → reconcile for one inbound frame, run inside the
/// frame's own handling turn.
#[derive(Debug)]
pub struct Pipeline {
    resolver: SymbolResolver,
    store: SnapshotStore,
}

impl Pipeline {
    pub fn new(resolver: SymbolResolver, store: SnapshotStore) -> Self {
        Self { resolver, store }
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<EntitySnapshot>> {
        self.store.subscribe()
    }

    pub fn handle_frame(&mut self, text: &str) -> FrameOutcome {
        let ticker = match decode::decode(text) {
            Ok(Decoded::Ticker(ticker)) => ticker,
            Ok(Decoded::Ignored) => {
                metrics::record_feed_message("ignored");
                return FrameOutcome::Ignored;
            }
            Err(err) => {
                warn!(error = %err, "dropping malformed feed message");
                metrics::record_feed_message("decode_error");
                return FrameOutcome::Malformed;
            }
        };
        metrics::record_feed_message("ticker");

        let Some(entity_id) = self.resolver.resolve(&ticker.symbol) else {
            trace!(symbol = %ticker.symbol, "ticker for untracked symbol");
            metrics::record_unknown("symbol");
            return FrameOutcome::UnknownSymbol;
        };

        let update = PartialUpdate::new(entity_id)
            .with_price(ticker.last_price)
            .with_change_24h(ticker.change_24h_pct)
            .with_volume_24h(ticker.quote_volume())
            .with_series_point(ticker.last_price);

        match self.store.apply(&update) {
            ApplyOutcome::Applied => {
                metrics::record_update_applied(&update.entity_id);
                FrameOutcome::Applied
            }
            ApplyOutcome::UnknownEntity => {
                metrics::record_unknown("entity");
                FrameOutcome::UnknownEntity
            }
        }
    }
}
