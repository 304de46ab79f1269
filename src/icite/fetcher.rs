//! Cache-aware retrieval of seed records and their one-hop associated sets
//!
//! The fetcher partitions requested identifiers into cached and missing ones,
//! fetches the missing ones in bounded batches, persists every fetched record
//! before returning it, and reports identifiers nobody could resolve instead of
//! failing the call.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, error, info, instrument, warn};

use crate::common::ids::validate_pmids;
use crate::config::FetchPolicy;
use crate::error::{ICiteError, Result};
use crate::icite::composite::{CompositeResolution, CompositeWork};
use crate::icite::models::Record;
use crate::icite::relations::AssociatedSetPolicy;
use crate::icite::service::CitationService;
use crate::store::RecordStore;

/// How many unresolved identifiers are spelled out in log output
const UNRESOLVED_PREVIEW: usize = 20;

/// Outcome of [`CitationGraphFetcher::resolve_many`]
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Resolved records keyed by PMID; iteration order is unspecified
    pub records: HashMap<u32, Record>,
    /// Requested identifiers found neither in the cache nor in any response
    pub unresolved: BTreeSet<u32>,
    pub from_cache: usize,
    pub fetched: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
}

impl Resolution {
    pub fn get(&self, pmid: u32) -> Option<&Record> {
        self.records.get(&pmid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reconciles requests against a [`RecordStore`] and a [`CitationService`]
///
/// Batches are sent strictly one after another, so no identifier is fetched
/// twice within a call and cache writes happen in a deterministic order.
///
/// # Example
///
/// ```no_run
/// use icite_client::{
///     AssociatedSetPolicy, CitationGraphFetcher, FileStore, ICiteClient, StoreConfig,
/// };
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStore::open(&StoreConfig::new("icite-cache"))?;
///     let fetcher = CitationGraphFetcher::new(ICiteClient::new(), store);
///
///     let resolution = fetcher
///         .resolve_composite(&[31978945, 25760099], &AssociatedSetPolicy::references(), false)
///         .await?;
///
///     for work in resolution.resolved() {
///         println!("{}: {} references resolved", work.seed_id, work.related.len());
///     }
///     Ok(())
/// }
/// ```
pub struct CitationGraphFetcher<S, R> {
    service: S,
    store: R,
    policy: FetchPolicy,
}

impl<S, R> CitationGraphFetcher<S, R>
where
    S: CitationService,
    R: RecordStore,
{
    pub fn new(service: S, store: R) -> Self {
        Self::with_policy(service, store, FetchPolicy::default())
    }

    pub fn with_policy(service: S, store: R, policy: FetchPolicy) -> Self {
        Self {
            service,
            store,
            policy,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Resolve a set of identifiers from the cache, fetching whatever is missing
    ///
    /// With `force_refresh` the cache is not consulted and every identifier is
    /// fetched again, overwriting its cached entry.
    ///
    /// # Errors
    ///
    /// Only configuration errors are returned: a zero identifier, or a service
    /// that rejects a batch as too large. Failed batches and identifiers the
    /// service does not know are reported in the [`Resolution`].
    #[instrument(skip(self, ids))]
    pub async fn resolve_many<I>(&self, ids: I, force_refresh: bool) -> Result<Resolution>
    where
        I: IntoIterator<Item = u32>,
    {
        let requested: BTreeSet<u32> = validate_pmids(ids)?.into_iter().map(u32::from).collect();

        let mut resolution = Resolution::default();
        if requested.is_empty() {
            return Ok(resolution);
        }

        let batch_size = self.batch_size()?;

        let missing: Vec<u32> = if force_refresh {
            requested.iter().copied().collect()
        } else {
            let mut missing = Vec::new();
            for &pmid in &requested {
                match self.load_cached(pmid).await {
                    Some(record) => {
                        resolution.records.insert(pmid, record);
                        resolution.from_cache += 1;
                    }
                    None => missing.push(pmid),
                }
            }
            missing
        };

        debug!(
            requested = requested.len(),
            cached = resolution.from_cache,
            missing = missing.len(),
            batch_size,
            "Partitioned request against cache"
        );

        for batch in missing.chunks(batch_size) {
            resolution.batches_sent += 1;
            match self.service.fetch_batch(batch).await {
                Ok(records) => {
                    let received = self.absorb_batch(batch, records, &mut resolution).await;
                    debug!(requested = batch.len(), received, "Batch absorbed");
                }
                Err(err) if err.is_config_error() => return Err(err),
                Err(err) => {
                    resolution.batches_failed += 1;
                    warn!(
                        batch_size = batch.len(),
                        first_pmid = batch[0],
                        error = %err,
                        "Batch fetch failed, identifiers left unresolved"
                    );
                }
            }
        }

        resolution.unresolved = requested
            .iter()
            .copied()
            .filter(|pmid| !resolution.records.contains_key(pmid))
            .collect();

        if !resolution.unresolved.is_empty() {
            let preview: Vec<u32> = resolution
                .unresolved
                .iter()
                .copied()
                .take(UNRESOLVED_PREVIEW)
                .collect();
            warn!(
                count = resolution.unresolved.len(),
                pmids = ?preview,
                "Identifiers could not be resolved"
            );
        }

        if resolution.batches_sent > 0 && resolution.batches_failed == resolution.batches_sent {
            error!(
                batches = resolution.batches_sent,
                "Every batch failed; returning cached records only"
            );
        }

        info!(
            requested = requested.len(),
            resolved = resolution.records.len(),
            from_cache = resolution.from_cache,
            fetched = resolution.fetched,
            batches_sent = resolution.batches_sent,
            batches_failed = resolution.batches_failed,
            "Resolve completed"
        );

        Ok(resolution)
    }

    /// Resolve one identifier; `Ok(None)` when it could not be resolved
    pub async fn resolve_one(&self, pmid: u32, force_refresh: bool) -> Result<Option<Record>> {
        let mut resolution = self.resolve_many([pmid], force_refresh).await?;
        Ok(resolution.records.remove(&pmid))
    }

    /// Resolve seeds and, under `policy`, one hop of associated works
    ///
    /// Works come back in first-seen seed order; duplicate seeds collapse.
    /// Associated identifiers are resolved in a single call that never forces a
    /// refresh, and associated works of associated works are never fetched.
    #[instrument(skip(self, seed_ids), fields(seeds = seed_ids.len()))]
    pub async fn resolve_composite(
        &self,
        seed_ids: &[u32],
        policy: &AssociatedSetPolicy,
        force_refresh: bool,
    ) -> Result<CompositeResolution> {
        let mut seen = HashSet::with_capacity(seed_ids.len());
        let order: Vec<u32> = seed_ids
            .iter()
            .copied()
            .filter(|pmid| seen.insert(*pmid))
            .collect();

        let seeds = self
            .resolve_many(order.iter().copied(), force_refresh)
            .await?;

        if policy.is_empty() {
            let unresolved_seeds = seeds.unresolved;
            let mut seed_records = seeds.records;
            let works = order
                .iter()
                .map(|pmid| match seed_records.remove(pmid) {
                    Some(record) => CompositeWork {
                        seed_id: *pmid,
                        seed_record: Some(record),
                        associated_ids: BTreeSet::new(),
                        related: BTreeMap::new(),
                    },
                    None => CompositeWork::unresolved(*pmid),
                })
                .collect();
            return Ok(CompositeResolution::new(
                works,
                unresolved_seeds,
                BTreeSet::new(),
            ));
        }

        let associated: HashMap<u32, BTreeSet<u32>> = seeds
            .records
            .iter()
            .map(|(pmid, record)| (*pmid, policy.related_ids(record)))
            .collect();

        let wanted: BTreeSet<u32> = associated
            .values()
            .flatten()
            .copied()
            .filter(|pmid| *pmid != 0 && !seeds.records.contains_key(pmid))
            .collect();

        debug!(
            seeds = seeds.records.len(),
            associated = wanted.len(),
            "Resolving associated works"
        );

        let related = self.resolve_many(wanted, false).await?;

        let unresolved_seeds = seeds.unresolved;
        let mut seed_records = seeds.records;
        let mut works = Vec::with_capacity(order.len());
        for pmid in &order {
            let Some(associated_ids) = associated.get(pmid) else {
                works.push(CompositeWork::unresolved(*pmid));
                continue;
            };

            // Seeds citing each other were resolved in the first round
            let related_records: BTreeMap<u32, Record> = associated_ids
                .iter()
                .filter_map(|id| {
                    related
                        .records
                        .get(id)
                        .or_else(|| seed_records.get(id))
                        .map(|record| (*id, record.clone()))
                })
                .collect();

            works.push(CompositeWork {
                seed_id: *pmid,
                seed_record: None,
                associated_ids: associated_ids.clone(),
                related: related_records,
            });
        }

        for work in &mut works {
            if associated.contains_key(&work.seed_id) {
                work.seed_record = seed_records.remove(&work.seed_id);
            }
        }

        Ok(CompositeResolution::new(
            works,
            unresolved_seeds,
            related.unresolved,
        ))
    }

    fn batch_size(&self) -> Result<usize> {
        let service_max = self.service.max_batch_size();
        if service_max == 0 {
            return Err(ICiteError::InvalidBatchSize {
                size: service_max,
                maximum: self.policy.max_batch_size(),
            });
        }
        Ok(self.policy.max_batch_size().min(service_max))
    }

    /// Cached record for `pmid`, or `None` when it must be fetched
    ///
    /// Unreadable entries count as misses; the refetch overwrites them.
    async fn load_cached(&self, pmid: u32) -> Option<Record> {
        match self.store.exists(pmid).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                warn!(pmid, error = %err, "Cache lookup failed, treating as miss");
                return None;
            }
        }

        match self.store.load(pmid).await {
            Ok(Some(record)) => {
                debug!(pmid, "Cache hit");
                Some(record)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(pmid, error = %err, "Unreadable cache entry, refetching");
                None
            }
        }
    }

    /// Group, persist and collect the records of one batch response
    ///
    /// Records for identifiers outside `batch`, and repeats within the
    /// response, are dropped. Returns the number of records accepted.
    async fn absorb_batch(
        &self,
        batch: &[u32],
        records: Vec<Record>,
        resolution: &mut Resolution,
    ) -> usize {
        let wanted: HashSet<u32> = batch.iter().copied().collect();
        let mut received = 0;

        for mut record in records {
            if !wanted.contains(&record.id) || resolution.records.contains_key(&record.id) {
                debug!(pmid = record.id, "Ignoring unrequested or repeated record");
                continue;
            }

            record.assign_group(self.policy.thresholds());

            if let Err(err) = self.store.save(&record).await {
                warn!(pmid = record.id, error = %err, "Failed to persist record");
            }

            resolution.records.insert(record.id, record);
            resolution.fetched += 1;
            received += 1;
        }

        received
    }
}
