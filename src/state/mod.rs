pub mod entity;
pub mod reconciler;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use entity::{Entity, RollingSeries};
pub use reconciler::ApplyOutcome;
pub use snapshot::{EntitySnapshot, SnapshotError};
pub use store::SnapshotStore;
