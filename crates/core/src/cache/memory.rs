//! In-memory partition store.
//!
//! Nothing survives a restart. Used by tests and by `in_memory` deployments.
//! Failures can be injected per operation class to exercise the controller's
//! error policy.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::RequestKey;
use super::storage::{CacheStorage, EntrySummary};
use crate::Error;
use crate::http::Response;

#[derive(Debug, Clone)]
struct StoredEntry {
    key: RequestKey,
    response: Response,
    stored_at: String,
    seq: u64,
}

#[derive(Debug, Default)]
struct Partition {
    entries: HashMap<String, StoredEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Creation order is significant for `match_any`.
    partitions: Vec<(String, Partition)>,
    seq: u64,
}

impl Inner {
    fn partition(&self, name: &str) -> Option<&Partition> {
        self.partitions.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    fn partition_mut(&mut self, name: &str) -> Option<&mut Partition> {
        self.partitions.iter_mut().find(|(n, _)| n == name).map(|(_, p)| p)
    }
}

/// Partition store backed by a `HashMap` behind a tokio `RwLock`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
    fail_writes: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    fail_keys: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put`/`put_all` fail, as under quota pressure.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every `delete` fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make partition enumeration fail.
    pub fn fail_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("quota exceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        if inner.partition(name).is_none() {
            inner.partitions.push((name.to_string(), Partition::default()));
        }
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.inner.read().await.partition(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        if self.fail_keys.load(Ordering::SeqCst) {
            return Err(Error::Storage("partition enumeration unavailable".into()));
        }
        Ok(self
            .inner
            .read()
            .await
            .partitions
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("cannot delete {name}")));
        }
        let mut inner = self.inner.write().await;
        let before = inner.partitions.len();
        inner.partitions.retain(|(n, _)| n != name);
        Ok(inner.partitions.len() != before)
    }

    async fn match_entry(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .partition(name)
            .and_then(|p| p.entries.get(&key.hash))
            .map(|e| e.response.clone()))
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .partitions
            .iter()
            .find_map(|(_, p)| p.entries.get(&key.hash))
            .map(|e| e.response.clone()))
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.put_all(name, &[(key.clone(), response.clone())]).await
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        self.check_write()?;
        let stored_at = chrono::Utc::now().to_rfc3339();
        let mut inner = self.inner.write().await;
        let mut seq = inner.seq;
        let partition = inner
            .partition_mut(name)
            .ok_or_else(|| Error::Storage(format!("no such partition: {name}")))?;
        for (key, response) in entries {
            seq += 1;
            partition.entries.insert(
                key.hash.clone(),
                StoredEntry { key: key.clone(), response: response.clone(), stored_at: stored_at.clone(), seq },
            );
        }
        inner.seq = seq;
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<EntrySummary>, Error> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&StoredEntry> = inner
            .partition(name)
            .map(|p| p.entries.values().collect())
            .unwrap_or_default();
        entries.sort_by_key(|e| e.seq);
        Ok(entries
            .into_iter()
            .map(|e| EntrySummary {
                hash: e.key.hash.clone(),
                method: e.key.method.to_string(),
                url: e.key.url.clone(),
                status: e.response.status,
                stored_at: e.stored_at.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("https://legallyup.test").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_put_into_open_partition() {
        let storage = MemoryStorage::new();
        storage.open("legallyup-api-v1").await.unwrap();
        storage
            .put("legallyup-api-v1", &key("/api/widgets"), &Response::new(200, "[]"))
            .await
            .unwrap();

        assert_eq!(storage.entries("legallyup-api-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_does_not_recreate_deleted_partition() {
        let storage = MemoryStorage::new();
        storage.open("legallyup-api-v1").await.unwrap();
        storage.delete("legallyup-api-v1").await.unwrap();

        let result = storage.put("legallyup-api-v1", &key("/api/widgets"), &Response::new(200, "[]")).await;

        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_any_creation_order() {
        let storage = MemoryStorage::new();
        storage.open("first").await.unwrap();
        storage.open("second").await.unwrap();
        storage.put("second", &key("/"), &Response::new(200, "second")).await.unwrap();
        storage.put("first", &key("/"), &Response::new(200, "first")).await.unwrap();

        let hit = storage.match_any(&key("/")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"first");
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let storage = MemoryStorage::new();
        storage.open("legallyup-api-v1").await.unwrap();
        storage.fail_writes(true);

        let result = storage.put("legallyup-api-v1", &key("/api/x"), &Response::new(200, "")).await;
        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(storage.entries("legallyup-api-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let storage = MemoryStorage::new();
        storage.open("legallyup-v1").await.unwrap();

        assert!(storage.delete("legallyup-v1").await.unwrap());
        assert!(!storage.delete("legallyup-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_in_write_order() {
        let storage = MemoryStorage::new();
        storage.open("s").await.unwrap();
        storage.put("s", &key("/b"), &Response::new(200, "")).await.unwrap();
        storage.put("s", &key("/a"), &Response::new(200, "")).await.unwrap();

        let urls: Vec<String> = storage.entries("s").await.unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://legallyup.test/b", "https://legallyup.test/a"]);
    }
}
