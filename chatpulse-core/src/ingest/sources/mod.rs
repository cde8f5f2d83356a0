//! Field tables for each supported backing store
//!
//! - [`fixture`]: the embedded demo dataset (flat widget export)
//! - [`live`]: the live store tables

pub mod fixture;
pub mod live;

pub use fixture::FIXTURE_SCHEMA;
pub use live::LIVE_SCHEMA;
