use tracing::debug;

use crate::market_data::types::PartialUpdate;
use crate::state::snapshot::EntitySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    UnknownEntity,
}

/// Merges `update` into its entity.
///
/// Present scalars overwrite, absent ones are left alone, and a price
/// observation is appended to the rolling series. Unknown ids are a no-op:
/// the tracked set is closed.
pub fn apply(snapshot: &mut EntitySnapshot, update: &PartialUpdate) -> ApplyOutcome {
    let Some(entity) = snapshot.get_mut(&update.entity_id) else {
        debug!(entity_id = %update.entity_id, "update for untracked entity dropped");
        return ApplyOutcome::UnknownEntity;
    };

    if let Some(price) = update.price {
        entity.price = price;
    }
    if let Some(change) = update.price_change_24h {
        entity.price_change_24h = change;
    }
    if let Some(volume) = update.volume_24h {
        entity.volume_24h = volume;
    }
    if let Some(point) = update.observation() {
        entity.series.push(point);
    }

    ApplyOutcome::Applied
}
