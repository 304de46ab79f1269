//! Integration tests for cache reconciliation and batching in `resolve_many`
//!
//! A recording in-process service stands in for iCite so batch counts and
//! contents can be asserted exactly.

#[path = "common/mod.rs"]
mod common;

use common::{
    MockService, RecordingStore, mock_fetcher, mock_fetcher_with_policy, record, recording_fetcher,
};
use icite_client::{
    FetchPolicy, ICiteError, ImpactGroup, PercentileThresholds, RecordStore,
};
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_batch_sizes_for_2500_new_identifiers() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, 2500));

    let resolution = fetcher.resolve_many(1..=2500, false).await.unwrap();

    assert_eq!(resolution.len(), 2500);
    assert_eq!(service.batch_sizes(), vec![1000, 1000, 500]);
    assert_eq!(resolution.batches_sent, 3);
    assert_eq!(resolution.batches_failed, 0);
    assert!(resolution.unresolved.is_empty());
}

#[tokio::test]
async fn test_batch_count_is_ceiling_of_n_over_max() {
    for (n, expected) in [(1u32, 1usize), (999, 1), (1000, 1), (1001, 2), (3000, 3)] {
        let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, n));
        fetcher.resolve_many(1..=n, false).await.unwrap();
        assert_eq!(service.call_count(), expected, "N = {n}");
    }
}

#[tokio::test]
async fn test_batches_never_repeat_identifiers() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, 2200));

    fetcher.resolve_many(1..=2200, false).await.unwrap();

    let calls = service.calls();
    let total: usize = calls.iter().map(Vec::len).sum();
    assert_eq!(total, 2200);
    assert_eq!(service.requested_ids().len(), 2200);
}

#[tokio::test]
#[traced_test]
async fn test_second_identical_call_hits_cache() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(100, 100));

    let first = fetcher.resolve_many([100], false).await.unwrap();
    assert_eq!(first.fetched, 1);
    assert_eq!(service.call_count(), 1);

    service.reset_calls();
    let second = fetcher.resolve_many([100], false).await.unwrap();

    assert_eq!(service.call_count(), 0);
    assert_eq!(second.from_cache, 1);
    assert_eq!(second.fetched, 0);
    assert_eq!(second.get(100), first.get(100));
}

#[tokio::test]
async fn test_only_missing_identifiers_are_fetched() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, 10));

    fetcher.resolve_many([1, 2, 3], false).await.unwrap();
    service.reset_calls();

    let resolution = fetcher.resolve_many(1..=10, false).await.unwrap();

    assert_eq!(service.calls(), vec![(4..=10).collect::<Vec<u32>>()]);
    assert_eq!(resolution.from_cache, 3);
    assert_eq!(resolution.fetched, 7);
}

#[tokio::test]
#[traced_test]
async fn test_partial_response_reports_missing() {
    let service = MockService::new();
    service.insert(record(100, &[], &[], &[]));
    service.insert(record(200, &[], &[], &[]));
    let (fetcher, _service, _store) = mock_fetcher(service);

    let resolution = fetcher.resolve_many([100, 200, 300], false).await.unwrap();

    assert_eq!(resolution.len(), 2);
    assert!(resolution.get(300).is_none());
    assert_eq!(resolution.unresolved, [300].into_iter().collect());
    assert!(logs_contain("Identifiers could not be resolved"));
}

#[tokio::test]
#[traced_test]
async fn test_failed_batch_does_not_abort_others() {
    let service = MockService::with_range(1, 6);
    service.fail_on(3);
    let policy = FetchPolicy::new().with_max_batch_size(2).unwrap();
    let (fetcher, service, _store) = mock_fetcher_with_policy(service, policy);

    let resolution = fetcher.resolve_many(1..=6, false).await.unwrap();

    assert_eq!(service.batch_sizes(), vec![2, 2, 2]);
    assert_eq!(resolution.batches_failed, 1);
    assert_eq!(resolution.len(), 4);
    assert_eq!(resolution.unresolved, [3, 4].into_iter().collect());
    assert!(logs_contain("Batch fetch failed"));
}

#[tokio::test]
#[traced_test]
async fn test_all_batches_failing_returns_cached_records() {
    let service = MockService::with_range(1, 4);
    let (fetcher, service, _store) = mock_fetcher(service);
    fetcher.resolve_many([1], false).await.unwrap();

    service.fail_on(2);
    let resolution = fetcher.resolve_many(1..=4, false).await.unwrap();

    assert_eq!(resolution.batches_sent, 1);
    assert_eq!(resolution.batches_failed, 1);
    assert_eq!(resolution.len(), 1);
    assert!(resolution.get(1).is_some());
    assert_eq!(resolution.unresolved, [2, 3, 4].into_iter().collect());
    assert!(logs_contain("Every batch failed"));
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, 3));

    let resolution = fetcher.resolve_many(Vec::new(), false).await.unwrap();

    assert!(resolution.is_empty());
    assert_eq!(resolution.batches_sent, 0);
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn test_repeated_identifiers_collapse() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, 3));

    let resolution = fetcher.resolve_many([2, 1, 2, 3, 1], false).await.unwrap();

    assert_eq!(resolution.len(), 3);
    assert_eq!(service.batch_sizes(), vec![3]);
}

#[tokio::test]
async fn test_zero_identifier_is_config_error() {
    let (fetcher, service, _store) = mock_fetcher(MockService::with_range(1, 3));

    let err = fetcher.resolve_many([1, 0, 2], false).await.unwrap_err();

    assert!(matches!(err, ICiteError::InvalidPmid { .. }));
    assert!(err.is_config_error());
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn test_records_are_persisted() {
    let (fetcher, _service, store) = mock_fetcher(MockService::with_range(1, 5));

    let resolution = fetcher.resolve_many(1..=5, false).await.unwrap();

    for (pmid, record) in &resolution.records {
        assert!(store.exists(*pmid).await.unwrap());
        assert_eq!(store.load(*pmid).await.unwrap().as_ref(), Some(record));
    }
}

#[tokio::test]
async fn test_force_refresh_overwrites_cache() {
    let (fetcher, service, store) = mock_fetcher(MockService::with_range(7, 7));
    fetcher.resolve_many([7], false).await.unwrap();

    let mut updated = record(7, &[1, 2], &[], &[]);
    updated.title = "Corrected title".to_string();
    updated.percentile = Some(99.0);
    service.insert(updated);
    service.reset_calls();

    let cached = fetcher.resolve_many([7], false).await.unwrap();
    assert_eq!(cached.get(7).unwrap().title, "Work 7");
    assert_eq!(service.call_count(), 0);

    let refreshed = fetcher.resolve_many([7], true).await.unwrap();
    assert_eq!(service.call_count(), 1);
    assert_eq!(refreshed.from_cache, 0);

    let stored = store.load(7).await.unwrap().unwrap();
    assert_eq!(stored.title, "Corrected title");
    assert_eq!(stored.cited_by.len(), 2);
    assert_eq!(stored.group, ImpactGroup::VeryHigh);
}

#[tokio::test]
async fn test_group_assigned_with_configured_thresholds() {
    let service = MockService::new();
    let mut low = record(1, &[], &[], &[]);
    low.percentile = Some(30.0);
    service.insert(low);
    let mut unknown = record(2, &[], &[], &[]);
    unknown.percentile = None;
    service.insert(unknown);

    let thresholds = PercentileThresholds::new([10.0, 40.0, 60.0, 90.0]).unwrap();
    let policy = FetchPolicy::new().with_thresholds(thresholds);
    let (fetcher, _service, _store) = mock_fetcher_with_policy(service, policy);

    let resolution = fetcher.resolve_many([1, 2], false).await.unwrap();

    assert_eq!(resolution.get(1).unwrap().group, ImpactGroup::Low);
    assert_eq!(resolution.get(2).unwrap().group, ImpactGroup::Indeterminate);
}

#[tokio::test]
async fn test_cached_group_is_not_recomputed() {
    let (fetcher, service, store) = mock_fetcher(MockService::new());

    // Grouped under some earlier threshold set
    let mut cached = record(5, &[], &[], &[]);
    cached.percentile = Some(99.0);
    cached.group = ImpactGroup::Low;
    store.save(&cached).await.unwrap();

    let resolution = fetcher.resolve_many([5], false).await.unwrap();

    assert_eq!(service.call_count(), 0);
    assert_eq!(resolution.get(5).unwrap().group, ImpactGroup::Low);
}

#[tokio::test]
async fn test_unrequested_records_are_ignored() {
    let service = MockService::with_range(1, 2);
    service.also_return(record(999, &[], &[], &[]));
    let (fetcher, _service, store) = mock_fetcher(service);

    let resolution = fetcher.resolve_many([1, 2], false).await.unwrap();

    assert_eq!(resolution.len(), 2);
    assert!(resolution.get(999).is_none());
    assert!(!store.exists(999).await.unwrap());
}

#[tokio::test]
async fn test_service_batch_limit_is_respected() {
    let service = MockService::with_range(1, 700).with_max_batch(300);
    let (fetcher, service, _store) = mock_fetcher(service);

    fetcher.resolve_many(1..=700, false).await.unwrap();

    assert_eq!(service.batch_sizes(), vec![300, 300, 100]);
}

#[tokio::test]
async fn test_zero_service_batch_limit_is_config_error() {
    let service = MockService::with_range(1, 2).with_max_batch(0);
    let (fetcher, service, _store) = mock_fetcher(service);

    let err = fetcher.resolve_many([1, 2], false).await.unwrap_err();

    assert!(matches!(err, ICiteError::InvalidBatchSize { .. }));
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn test_resolve_one() {
    let (fetcher, _service, _store) = mock_fetcher(MockService::with_range(42, 42));

    let found = fetcher.resolve_one(42, false).await.unwrap();
    assert_eq!(found.map(|r| r.id), Some(42));

    let missing = fetcher.resolve_one(43, false).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[traced_test]
async fn test_store_lookup_error_is_treated_as_miss() {
    let store = RecordingStore::new();
    store.inner().save(&record(5, &[], &[], &[])).await.unwrap();
    store.break_lookup(5);
    let (fetcher, service, _store) =
        recording_fetcher(MockService::with_range(5, 6), store, FetchPolicy::default());

    let resolution = fetcher.resolve_many([5, 6], false).await.unwrap();

    assert_eq!(service.calls(), vec![vec![5, 6]]);
    assert_eq!(resolution.from_cache, 0);
    assert_eq!(resolution.fetched, 2);
    assert!(resolution.unresolved.is_empty());
    assert!(logs_contain("Cache lookup failed, treating as miss"));
}

#[tokio::test]
#[traced_test]
async fn test_store_write_error_still_returns_record() {
    let store = RecordingStore::new();
    store.break_write(3);
    let (fetcher, service, store) =
        recording_fetcher(MockService::with_range(1, 4), store, FetchPolicy::default());

    let resolution = fetcher.resolve_many(1..=4, false).await.unwrap();

    assert_eq!(resolution.len(), 4);
    assert_eq!(resolution.get(3).map(|r| r.id), Some(3));
    assert!(!store.inner().exists(3).await.unwrap());
    assert!(!store.saves().contains(&3));
    assert!(logs_contain("Failed to persist record"));

    // Only the unsaved record is fetched again
    service.reset_calls();
    fetcher.resolve_many(1..=4, false).await.unwrap();
    assert_eq!(service.calls(), vec![vec![3]]);
}

#[tokio::test]
async fn test_fetched_records_are_saved_in_batch_order() {
    let service = MockService::with_range(1, 6);
    service.fail_on(5);
    let policy = FetchPolicy::new().with_max_batch_size(2).unwrap();
    let (fetcher, _service, store) = recording_fetcher(service, RecordingStore::new(), policy);

    let resolution = fetcher.resolve_many(1..=6, false).await.unwrap();

    // Responses arrive reversed within each batch; batches stay in order
    assert_eq!(store.saves(), vec![2, 1, 4, 3]);
    assert_eq!(resolution.unresolved, [5, 6].into_iter().collect());

    // Everything fetched before the failing batch is already durable
    for pmid in store.saves() {
        let stored = store.inner().load(pmid).await.unwrap();
        assert_eq!(stored.as_ref(), resolution.get(pmid));
    }
}
