use std::sync::Arc;
use tokio::sync::watch;

use crate::market_data::types::PartialUpdate;
use crate::state::reconciler::{self, ApplyOutcome};
use crate::state::snapshot::EntitySnapshot;

/// Single-writer owner of the snapshot.
///
/// Each applied update publishes a fresh immutable generation; readers hold
/// an `Arc` to whichever generation they borrowed and never observe a
/// half-applied update.
#[derive(Debug)]
pub struct SnapshotStore {
    snapshot: EntitySnapshot,
    published: watch::Sender<Arc<EntitySnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: EntitySnapshot) -> Self {
        let (published, _) = watch::channel(Arc::new(snapshot.clone()));
        Self {
            snapshot,
            published,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<EntitySnapshot>> {
        self.published.subscribe()
    }

    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    pub fn apply(&mut self, update: &PartialUpdate) -> ApplyOutcome {
        let outcome = reconciler::apply(&mut self.snapshot, update);
        if outcome == ApplyOutcome::Applied {
            self.published.send_replace(Arc::new(self.snapshot.clone()));
        }
        outcome
    }
}
