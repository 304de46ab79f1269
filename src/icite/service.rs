use async_trait::async_trait;
use std::sync::Arc;

use crate::config::MAX_BATCH;
use crate::error::Result;
use crate::icite::models::Record;

/// Remote source of citation records
///
/// `fetch_batch` gives no guarantee about order or completeness: identifiers
/// the service has no data for are simply absent from the result, and callers
/// must reconcile by identifier, never by position.
#[async_trait]
pub trait CitationService: Send + Sync {
    /// Fetch a single record; fails when the service has none
    async fn fetch_one(&self, pmid: u32) -> Result<Record>;

    /// Fetch up to [`max_batch_size`](Self::max_batch_size) records in one call
    async fn fetch_batch(&self, pmids: &[u32]) -> Result<Vec<Record>>;

    /// Largest batch accepted by `fetch_batch`
    fn max_batch_size(&self) -> usize {
        MAX_BATCH
    }
}

#[async_trait]
impl<S: CitationService + ?Sized> CitationService for Arc<S> {
    async fn fetch_one(&self, pmid: u32) -> Result<Record> {
        (**self).fetch_one(pmid).await
    }

    async fn fetch_batch(&self, pmids: &[u32]) -> Result<Vec<Record>> {
        (**self).fetch_batch(pmids).await
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }
}
