//! Integration tests for the on-disk record store driven through the fetcher

#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{MockService, record};
use icite_client::{
    CitationGraphFetcher, FetchPolicy, FileStore, ImpactGroup, PercentileThresholds, RecordStore,
    StoreConfig,
};
use tracing_test::traced_test;

fn open_store(dir: &tempfile::TempDir) -> FileStore {
    FileStore::open(&StoreConfig::new(dir.path())).unwrap()
}

#[tokio::test]
async fn test_full_record_survives_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let mut original = record(31978945, &[1, 2, 3], &[4], &[5, 6]);
    original.title = "Ünïcode tïtle, with \"quotes\"".to_string();
    original.is_clinical = true;
    original.provisional = true;
    original.human = 0.333333333333;
    original.animal = 0.5;
    original.molecular_cellular = 0.166666666667;
    original.percentile = Some(87.654321);
    original.group = ImpactGroup::High;

    store.save(&original).await.unwrap();
    let loaded = store.load(31978945).await.unwrap().unwrap();

    assert_eq!(loaded, original);
}

#[tokio::test]
async fn test_entries_persist_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();

    {
        let service = Arc::new(MockService::with_range(1, 3));
        let fetcher = CitationGraphFetcher::new(service.clone(), open_store(&dir));
        fetcher.resolve_many(1..=3, false).await.unwrap();
        assert_eq!(service.call_count(), 1);
    }

    let service = Arc::new(MockService::with_range(1, 3));
    let fetcher = CitationGraphFetcher::new(service.clone(), open_store(&dir));
    let resolution = fetcher.resolve_many(1..=3, false).await.unwrap();

    assert_eq!(service.call_count(), 0);
    assert_eq!(resolution.from_cache, 3);
    assert!(dir.path().join("2.json").exists());
}

#[tokio::test]
#[traced_test]
async fn test_corrupt_entry_is_refetched_and_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    std::fs::write(store.path_for(9), b"{\"id\": 9, \"title\": trunc").unwrap();

    let service = Arc::new(MockService::with_range(9, 9));
    let fetcher = CitationGraphFetcher::new(service.clone(), store.clone());

    let resolution = fetcher.resolve_many([9], false).await.unwrap();

    assert_eq!(service.calls(), vec![vec![9]]);
    assert_eq!(resolution.fetched, 1);
    assert!(logs_contain("Unreadable cache entry"));

    let repaired = store.load(9).await.unwrap().unwrap();
    assert_eq!(repaired.title, "Work 9");
}

#[tokio::test]
async fn test_cached_group_survives_threshold_change() {
    let dir = tempfile::tempdir().unwrap();

    let mut source = record(4, &[], &[], &[]);
    source.percentile = Some(50.0);
    let service = MockService::new();
    service.insert(source);
    let service = Arc::new(service);

    let fetcher = CitationGraphFetcher::new(service.clone(), open_store(&dir));
    let first = fetcher.resolve_many([4], false).await.unwrap();
    assert_eq!(first.get(4).unwrap().group, ImpactGroup::Average);

    // Different cut points put 50.0 in High, but the stored group wins
    let thresholds = PercentileThresholds::new([5.0, 10.0, 20.0, 60.0]).unwrap();
    let policy = FetchPolicy::new().with_thresholds(thresholds);
    let fetcher = CitationGraphFetcher::with_policy(service.clone(), open_store(&dir), policy);
    let second = fetcher.resolve_many([4], false).await.unwrap();

    assert_eq!(second.get(4).unwrap().group, ImpactGroup::Average);
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn test_directory_holds_only_entries() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CitationGraphFetcher::new(MockService::with_range(1, 20), open_store(&dir));

    fetcher.resolve_many(1..=20, false).await.unwrap();

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(names.len(), 20);
    assert!(names.iter().all(|name| name.ends_with(".json")));
}
