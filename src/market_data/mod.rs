pub mod adapters;
pub mod decode;
pub mod feed;
pub mod ingest;
pub mod supervisor;
pub mod symbols;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use feed::FeedClient;
pub use ingest::{FrameOutcome, Pipeline};
pub use supervisor::{ReconnectSupervisor, SupervisorConfig};
pub use symbols::SymbolResolver;
pub use transport::{Connector, FeedConnection, FeedError};
pub use types::{Instrument, LinkState, PartialUpdate};
