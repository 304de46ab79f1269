//! iCite citation metadata: records, the remote service, and the cache-aware fetcher
//!
//! - `models` - the cached [`Record`]
//! - `responses` / `deserializers` - iCite JSON wire format and its normalization
//! - `grouper` - percentile → [`ImpactGroup`] classification
//! - `relations` - relation tags and the [`AssociatedSetPolicy`]
//! - `service` / `client` - the [`CitationService`] seam and its HTTP implementation
//! - `fetcher` - the [`CitationGraphFetcher`] reconciling cache and service
//! - `composite` - per-seed [`CompositeWork`] bundles

pub mod client;
pub mod composite;
mod deserializers;
pub mod fetcher;
pub mod grouper;
pub mod models;
pub mod relations;
pub(crate) mod responses;
pub mod service;

pub use client::ICiteClient;
pub use composite::{CompositeResolution, CompositeWork};
pub use fetcher::{CitationGraphFetcher, Resolution};
pub use grouper::{ImpactGroup, PercentileThresholds, group_of};
pub use models::Record;
pub use relations::{AssociatedSetPolicy, Relation};
pub use service::CitationService;
