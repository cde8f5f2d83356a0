//! # chatpulse-core
//!
//! Analytics aggregation layer for a conversational-assistant platform.
//!
//! This library provides:
//! - Canonical records for chat sessions, analyses, and messages
//! - Declarative mapping from raw store rows into those records
//! - Two interchangeable backing stores (bundled fixtures, live PostgREST)
//! - A router choosing the store per tenant
//! - Pure aggregation functions and a facade exposing them per owner
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Raw:** rows as a backing store returns them ([`ingest::RawRow`])
//! - **Canonical:** [`Session`], [`SessionAnalysis`], [`ChatMessage`]
//! - **Aggregated:** statistics recomputed on every request ([`analytics`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatpulse_core::{Config, DateRange, Router};
//!
//! # async fn run() -> chatpulse_core::Result<()> {
//! let config = Config::load()?;
//! let router = Router::new(&config);
//!
//! let ops = router.resolve("demo-client");
//! let overview = ops
//!     .aggregations()
//!     .overview_by_tenant("demo-client", &DateRange::unbounded())
//!     .await?;
//! println!("{} sessions", overview.total_sessions);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::{Config, StoreScope};
pub use error::{Error, Result};
pub use operations::AnalyticsOperations;
pub use router::{BackendChoice, DemoTenants, Router, TenantClassifier};
pub use store::{AnalyticsBackend, FixtureStore, LiveStore, Owner};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod operations;
pub mod router;
pub mod store;
pub mod types;
