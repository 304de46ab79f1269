//! # iCite Client
//!
//! An async client for the NIH iCite citation-metrics API, built around a
//! persistent per-record cache so repeated runs never re-download records they
//! already hold.
//!
//! ## Features
//!
//! - **Cache reconciliation**: requested PMIDs are split into cached and missing,
//!   and only the missing ones are fetched
//! - **Bounded batches**: at most 1000 identifiers per request, sent sequentially
//! - **Partial results**: failed batches and unknown identifiers are reported, not fatal
//! - **One-hop expansion**: optionally resolve the works citing or referenced by each seed
//! - **Impact groups**: every fetched record is classified by its NIH percentile
//!
//! ## Quick Start
//!
//! ```no_run
//! use icite_client::{
//!     AssociatedSetPolicy, CitationGraphFetcher, FileStore, ICiteClient, StoreConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tracing_subscriber::fmt()
//!         .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
//!         .init();
//!
//!     let store = FileStore::open(&StoreConfig::new("icite-cache"))?;
//!     let fetcher = CitationGraphFetcher::new(ICiteClient::new(), store);
//!
//!     let policy = AssociatedSetPolicy::from_tags(["cited_by", "cited_by_clin"])?;
//!     let resolution = fetcher
//!         .resolve_composite(&[31978945, 33515491], &policy, false)
//!         .await?;
//!
//!     for work in resolution.resolved() {
//!         println!(
//!             "PMID {}: {} citing works resolved, {} missing",
//!             work.seed_id,
//!             work.related.len(),
//!             work.missing_related().count()
//!         );
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod icite;
pub mod rate_limit;
pub mod retry;
pub mod store;

// Re-export main types for convenience
pub use common::PubMedId;
pub use config::{ClientConfig, FetchPolicy, MAX_BATCH, StoreConfig};
pub use error::{ICiteError, Result};
pub use icite::{
    AssociatedSetPolicy, CitationGraphFetcher, CitationService, CompositeResolution,
    CompositeWork, ICiteClient, ImpactGroup, PercentileThresholds, Record, Relation, Resolution,
    group_of,
};
pub use retry::RetryConfig;
pub use store::{FileStore, MemoryStore, RecordStore};
