//! Persistent record storage, one entry per identifier

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{ICiteError, Result};
use crate::icite::models::Record;

/// Storage for fetched records
///
/// A `save` followed by a `load` of the same identifier returns an equal
/// record. Nothing is assumed about atomicity across processes beyond what an
/// individual backend documents.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn exists(&self, pmid: u32) -> Result<bool>;

    /// `Ok(None)` when absent; `Err(CacheReadError)` when present but unreadable
    async fn load(&self, pmid: u32) -> Result<Option<Record>>;

    /// Write `record` under `record.id`, replacing any previous entry wholesale
    async fn save(&self, record: &Record) -> Result<()>;
}

#[async_trait]
impl<R: RecordStore + ?Sized> RecordStore for Arc<R> {
    async fn exists(&self, pmid: u32) -> Result<bool> {
        (**self).exists(pmid).await
    }

    async fn load(&self, pmid: u32) -> Result<Option<Record>> {
        (**self).load(pmid).await
    }

    async fn save(&self, record: &Record) -> Result<()> {
        (**self).save(record).await
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// One JSON file per PMID under a cache directory
///
/// Writes land in a temporary file in the same directory and are renamed into
/// place, so readers never observe a partially written entry. Two processes
/// saving the same PMID race with last-write-wins semantics.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the cache directory
    pub fn open(config: &StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.directory)?;
        info!(directory = %config.directory.display(), "Opened record store");
        Ok(Self {
            directory: config.directory.clone(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, pmid: u32) -> PathBuf {
        self.directory.join(format!("{pmid}.json"))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn exists(&self, pmid: u32) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(pmid)).await?)
    }

    async fn load(&self, pmid: u32) -> Result<Option<Record>> {
        let bytes = match tokio::fs::read(self.path_for(pmid)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ICiteError::CacheReadError {
                    pmid,
                    message: err.to_string(),
                });
            }
        };

        let record: Record =
            serde_json::from_slice(&bytes).map_err(|err| ICiteError::CacheReadError {
                pmid,
                message: err.to_string(),
            })?;

        if record.id != pmid {
            return Err(ICiteError::CacheReadError {
                pmid,
                message: format!("entry holds record for PMID {}", record.id),
            });
        }

        debug!(pmid, "Loaded cached record");
        Ok(Some(record))
    }

    async fn save(&self, record: &Record) -> Result<()> {
        let json = serde_json::to_vec(record)?;
        let directory = self.directory.clone();
        let path = self.path_for(record.id);

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut file = NamedTempFile::new_in(&directory)?;
            file.write_all(&json)?;
            file.as_file().sync_all()?;
            file.persist(&path).map_err(|err| ICiteError::from(err.error))?;
            Ok(())
        })
        .await
        .map_err(|err| ICiteError::IoError {
            message: format!("record write task failed: {err}"),
        })??;

        debug!(pmid = record.id, "Saved record");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memory backend
// ---------------------------------------------------------------------------

/// In-process store backed by Moka, for tests and throwaway runs
#[derive(Clone)]
pub struct MemoryStore {
    cache: MokaCache<u32, Record>,
}

impl MemoryStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self {
            cache: MokaCache::builder().build(),
        }
    }

    /// Store that evicts once `max_capacity` records are held
    pub fn with_max_capacity(max_capacity: u64) -> Self {
        Self {
            cache: MokaCache::builder().max_capacity(max_capacity).build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn exists(&self, pmid: u32) -> Result<bool> {
        Ok(self.cache.contains_key(&pmid))
    }

    async fn load(&self, pmid: u32) -> Result<Option<Record>> {
        let result = self.cache.get(&pmid).await;
        if result.is_some() {
            debug!(pmid, "Cache hit");
        } else {
            debug!(pmid, "Cache miss");
        }
        Ok(result)
    }

    async fn save(&self, record: &Record) -> Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }
}
