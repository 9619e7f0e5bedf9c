// # Memory Registry Store
//
// In-memory implementation of RegistryStore.
//
// ## Purpose
//
// Same semantics as the file store without durability. All state is lost on
// restart. Useful for tests and throwaway deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::{ConfigPatch, RegistryConfig};
use crate::record::{NewRecord, RecordPatch, SubdomainRecord, composite_key};
use crate::traits::RegistryStore;

#[derive(Debug)]
struct Inner {
    records: HashMap<String, SubdomainRecord>,
    config: RegistryConfig,
}

/// In-memory registry store
///
/// Records and config live in a HashMap behind a single Mutex, which gives
/// the same one-writer-at-a-time discipline as the file store.
#[derive(Debug, Clone)]
pub struct MemoryRegistryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRegistryStore {
    /// Create a new empty store with the default configuration
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: HashMap::new(),
                config: RegistryConfig::default(),
            })),
        }
    }

    /// Number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.records.is_empty()
    }
}

impl Default for MemoryRegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistryStore {
    async fn get_all(&self) -> Result<HashMap<String, SubdomainRecord>, Error> {
        Ok(self.inner.lock().await.records.clone())
    }

    async fn get(&self, subdomain: &str, tld: &str) -> Result<Option<SubdomainRecord>, Error> {
        let inner = self.inner.lock().await;
        Ok(inner.records.get(&composite_key(subdomain, tld)).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<SubdomainRecord>, Error> {
        let inner = self.inner.lock().await;
        let mut matches: Vec<SubdomainRecord> = inner
            .records
            .values()
            .filter(|record| record.matches(query))
            .cloned()
            .collect();
        matches.sort_by_key(|record| record.key());
        Ok(matches)
    }

    async fn create(
        &self,
        subdomain: &str,
        tld: &str,
        fields: NewRecord,
    ) -> Result<SubdomainRecord, Error> {
        let mut inner = self.inner.lock().await;
        let key = composite_key(subdomain, tld);

        if inner.records.contains_key(&key) {
            return Err(Error::already_exists(key));
        }

        let record = SubdomainRecord::new(subdomain, tld, fields);
        inner.records.insert(key, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        subdomain: &str,
        tld: &str,
        patch: RecordPatch,
    ) -> Result<SubdomainRecord, Error> {
        let mut inner = self.inner.lock().await;
        let key = composite_key(subdomain, tld);

        let record = inner
            .records
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(key.clone()))?;
        record.apply(&patch);
        Ok(record.clone())
    }

    async fn delete(&self, subdomain: &str, tld: &str) -> Result<bool, Error> {
        let mut inner = self.inner.lock().await;
        Ok(inner.records.remove(&composite_key(subdomain, tld)).is_some())
    }

    async fn get_config(&self) -> Result<RegistryConfig, Error> {
        Ok(self.inner.lock().await.config.clone())
    }

    async fn update_config(&self, patch: ConfigPatch) -> Result<RegistryConfig, Error> {
        let mut inner = self.inner.lock().await;
        inner.config.apply(&patch);
        Ok(inner.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_crud() {
        let store = MemoryRegistryStore::new();
        assert!(store.is_empty().await);

        store
            .create("shop", "com", NewRecord::default())
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        let record = store.get("shop", "com").await.unwrap().unwrap();
        assert_eq!(record.status, "active");

        assert!(store.delete("shop", "com").await.unwrap());
        assert!(store.is_empty().await);
        assert!(!store.delete("shop", "com").await.unwrap());
    }

    #[tokio::test]
    async fn update_absent_key_does_not_create() {
        let store = MemoryRegistryStore::new();

        let err = store
            .update("ghost", "net", RecordPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.get("ghost", "net").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_filters_by_substring() {
        let store = MemoryRegistryStore::new();
        store
            .create("shop", "com", NewRecord::default())
            .await
            .unwrap();
        store
            .create("blog", "net", NewRecord::default())
            .await
            .unwrap();

        let hits = store.search("shop").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key(), "shop.com");

        assert!(store.search("missing").await.unwrap().is_empty());
    }
}
