//! Live ticker ingestion: a self-healing feed connection reconciled into an
//! in-process snapshot, with a sorted/filtered view kept current on top.

pub mod config;
pub mod market_data;
pub mod metrics;
pub mod persist;
pub mod state;
pub mod view;
