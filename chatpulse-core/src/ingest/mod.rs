//! Normalization of raw store rows into canonical records
//!
//! ## Design Principles
//!
//! 1. **One canonical shape**: both backing stores map into the types in
//!    [`crate::types`], so aggregation never sees source field names.
//! 2. **Mapping as data**: each source declares its field tables in
//!    [`sources`]; [`mapper`] evaluates them.
//! 3. **Resilience**: a malformed row degrades field by field and never
//!    aborts a batch.

pub mod mapper;
pub mod sources;

pub use mapper::{
    combine_tokens, parse_timestamp, rows_from_value, AnalysisFields, MessageFields, RawRow, Rule,
    SessionFields, SourceSchema,
};
pub use sources::{FIXTURE_SCHEMA, LIVE_SCHEMA};
