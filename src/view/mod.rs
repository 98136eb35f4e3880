pub mod config;
pub mod engine;
pub mod presenter;

pub use config::{Filter, SortDirection, SortKey, ViewConfig};
pub use engine::{compute, ViewEngine};
