//! Identifier types shared by the client, the store and the fetcher

pub mod ids;

pub use ids::PubMedId;
