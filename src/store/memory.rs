// src/store/memory.rs
// =============================================================================
// In-memory JobStore. Lives as long as the process.
//
// Every mutation (create, remove, append) takes the write lock, so one job's
// many link tasks can append concurrently without losing results. Reads take
// the read lock and see whatever has been appended so far.
// =============================================================================

use super::{JobStore, StoreError};
use crate::checker::LinkResult;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct Jobs {
    results: HashMap<String, Vec<LinkResult>>,
    // Ids that were removed, so late appends can tell "gone" from "never was".
    // Job ids are fresh UUIDs and never reused: create() on a removed id
    // clears its tombstone, after which a straggler from the old run would
    // append into the new one.
    removed: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<Jobs>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job_id: &str) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.results.contains_key(job_id) {
            return Err(StoreError::AlreadyExists(job_id.to_string()));
        }
        jobs.removed.remove(job_id);
        jobs.results.insert(job_id.to_string(), Vec::new());
        Ok(())
    }

    async fn remove(&self, job_id: &str) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.results.remove(job_id).is_none() {
            return Err(StoreError::NotFound(job_id.to_string()));
        }
        jobs.removed.insert(job_id.to_string());
        Ok(())
    }

    async fn append_failure(&self, job_id: &str, failure: LinkResult) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if let Some(results) = jobs.results.get_mut(job_id) {
            results.push(failure);
            return Ok(());
        }

        if jobs.removed.contains(job_id) {
            Err(StoreError::Removed(job_id.to_string()))
        } else {
            Err(StoreError::NotFound(job_id.to_string()))
        }
    }

    async fn list_failures(&self, job_id: &str) -> Result<Vec<LinkResult>, StoreError> {
        self.jobs
            .read()
            .await
            .results
            .get(job_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn failure(url: &str, status: u16) -> LinkResult {
        LinkResult {
            url: url.to_string(),
            status: Some(status),
            timeout: false,
        }
    }

    #[tokio::test]
    async fn test_new_job_has_no_failures() {
        let store = MemoryStore::new();
        store.create("job-1").await.unwrap();
        assert!(store.list_failures("job-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_create_leaves_first_job_untouched() {
        let store = MemoryStore::new();
        store.create("job-1").await.unwrap();
        store
            .append_failure("job-1", failure("https://example.com/a", 404))
            .await
            .unwrap();

        assert_eq!(
            store.create("job-1").await,
            Err(StoreError::AlreadyExists("job-1".to_string()))
        );
        assert_eq!(
            store.list_failures("job-1").await.unwrap(),
            vec![failure("https://example.com/a", 404)]
        );
    }

    #[tokio::test]
    async fn test_remove_then_lookup_and_remove_again() {
        let store = MemoryStore::new();
        store.create("job-1").await.unwrap();
        store.remove("job-1").await.unwrap();

        let not_found = Err(StoreError::NotFound("job-1".to_string()));
        assert_eq!(store.list_failures("job-1").await, not_found);
        assert_eq!(store.remove("job-1").await, Err(StoreError::NotFound("job-1".to_string())));
    }

    #[tokio::test]
    async fn test_append_after_remove_is_distinguishable() {
        let store = MemoryStore::new();
        store.create("gone").await.unwrap();
        store.remove("gone").await.unwrap();

        assert_eq!(
            store.append_failure("gone", failure("https://example.com", 500)).await,
            Err(StoreError::Removed("gone".to_string()))
        );
        assert_eq!(
            store.append_failure("never", failure("https://example.com", 500)).await,
            Err(StoreError::NotFound("never".to_string()))
        );
    }

    #[tokio::test]
    async fn test_recreating_a_removed_id_starts_fresh() {
        let store = MemoryStore::new();
        store.create("job-1").await.unwrap();
        store
            .append_failure("job-1", failure("https://example.com/a", 404))
            .await
            .unwrap();
        store.remove("job-1").await.unwrap();
        store.create("job-1").await.unwrap();

        assert!(store.list_failures("job-1").await.unwrap().is_empty());
        store
            .append_failure("job-1", failure("https://example.com/b", 410))
            .await
            .unwrap();
        assert_eq!(store.list_failures("job-1").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.create("busy").await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..200 {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .append_failure("busy", failure(&format!("https://example.com/{i}"), 404))
                    .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        assert_eq!(store.list_failures("busy").await.unwrap().len(), 200);
    }
}
