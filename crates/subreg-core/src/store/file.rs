// # File Registry Store
//
// File-backed implementation of RegistryStore.
//
// ## Persistence Model
//
// Two durable JSON documents under a data directory:
//
// - `subdomains.json`: versioned envelope holding the composite-key -> record
//   mapping
// - `registry.json`: the registry configuration document
//
// State is fully re-read from disk on every operation and fully re-written on
// every mutation; there is no in-memory cache that could desync from disk and
// no incremental patch format.
//
// ## Concurrency Protocol
//
// A single mutual-exclusion lock serializes every mutation's full
// read-modify-persist cycle. Two concurrent creates of the same key can never
// both succeed, and concurrent updates cannot lose writes. Reads skip the
// lock: documents are replaced via write-then-rename, so a read observes
// either the old document or the new one, never a torn write.
//
// ## Storage Corruption
//
// Absent or unparseable documents degrade to the empty/default state with a
// log line. The distinction between "absent" and "corrupt" is made explicit
// at load time and collapsed here, once, at the store boundary.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "shop.com": {
//       "subdomain": "shop",
//       "tld": "com",
//       "target": "1.2.3.4",
//       ...
//     }
//   }
// }
// ```

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::{ConfigPatch, RegistryConfig};
use crate::record::{NewRecord, RecordPatch, SubdomainRecord, composite_key};
use crate::traits::RegistryStore;

/// Records file format version, for future migration
const RECORDS_FILE_VERSION: &str = "1.0";

/// Records document file name
const RECORDS_FILE: &str = "subdomains.json";

/// Configuration document file name
const CONFIG_FILE: &str = "registry.json";

/// Outcome of loading a durable document
enum LoadOutcome<T> {
    /// Document present and parseable
    Present(T),
    /// Document does not exist yet
    Absent,
    /// Document exists but is not parseable
    Corrupt(serde_json::Error),
}

/// Serializable envelope for the record set
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RecordsDocument {
    version: String,
    records: HashMap<String, SubdomainRecord>,
}

impl RecordsDocument {
    fn new(records: HashMap<String, SubdomainRecord>) -> Self {
        Self {
            version: RECORDS_FILE_VERSION.to_string(),
            records,
        }
    }
}

/// File-backed registry store
///
/// # Example
///
/// ```rust,no_run
/// use subreg_core::store::FileRegistryStore;
/// use subreg_core::traits::RegistryStore;
/// use subreg_core::record::NewRecord;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRegistryStore::new("/var/lib/subreg").await?;
///
///     let record = store.create("shop", "com", NewRecord::default()).await?;
///     assert_eq!(record.key(), "shop.com");
///
///     let fetched = store.get("shop", "com").await?;
///     assert!(fetched.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRegistryStore {
    records_path: PathBuf,
    config_path: PathBuf,
    /// Serializes every read-modify-persist cycle
    write_lock: Mutex<()>,
}

impl FileRegistryStore {
    /// Create or open a file registry store rooted at `data_dir`
    ///
    /// On first use the directory and both documents are initialized: an
    /// empty record set and a configuration document with defaults.
    pub async fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, Error> {
        let data_dir = data_dir.as_ref();

        fs::create_dir_all(data_dir).await.map_err(|e| {
            Error::storage(format!(
                "failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let store = Self {
            records_path: data_dir.join(RECORDS_FILE),
            config_path: data_dir.join(CONFIG_FILE),
            write_lock: Mutex::new(()),
        };

        if !store.records_path.exists() {
            store
                .persist(&store.records_path, &RecordsDocument::new(HashMap::new()))
                .await?;
            tracing::info!(path = %store.records_path.display(), "initialized empty record set");
        }
        if !store.config_path.exists() {
            store
                .persist(&store.config_path, &RegistryConfig::default())
                .await?;
            tracing::info!(path = %store.config_path.display(), "initialized default registry config");
        }

        Ok(store)
    }

    /// Load and parse a document, distinguishing absent from corrupt
    async fn load<T: DeserializeOwned>(path: &Path) -> Result<LoadOutcome<T>, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadOutcome::Absent),
            Err(e) => {
                return Err(Error::storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(LoadOutcome::Present(value)),
            Err(e) => Ok(LoadOutcome::Corrupt(e)),
        }
    }

    /// Read the record set, degrading absent or corrupt state to empty
    async fn load_records(&self) -> Result<HashMap<String, SubdomainRecord>, Error> {
        match Self::load::<RecordsDocument>(&self.records_path).await? {
            LoadOutcome::Present(document) => {
                if document.version != RECORDS_FILE_VERSION {
                    tracing::warn!(
                        expected = RECORDS_FILE_VERSION,
                        found = %document.version,
                        "record set version mismatch, loading anyway"
                    );
                }
                Ok(document.records)
            }
            LoadOutcome::Absent => Ok(HashMap::new()),
            LoadOutcome::Corrupt(e) => {
                tracing::warn!(
                    path = %self.records_path.display(),
                    error = %e,
                    "record set unparseable, treating as empty"
                );
                Ok(HashMap::new())
            }
        }
    }

    /// Read the configuration document, degrading to defaults
    async fn load_config(&self) -> Result<RegistryConfig, Error> {
        match Self::load::<RegistryConfig>(&self.config_path).await? {
            LoadOutcome::Present(config) => Ok(config),
            LoadOutcome::Absent => Ok(RegistryConfig::default()),
            LoadOutcome::Corrupt(e) => {
                tracing::warn!(
                    path = %self.config_path.display(),
                    error = %e,
                    "registry config unparseable, falling back to defaults"
                );
                Ok(RegistryConfig::default())
            }
        }
    }

    /// Atomically replace a document on disk
    ///
    /// Writes the full serialized document to a temporary file, flushes, then
    /// renames over the target. Readers see either the old or the new
    /// document.
    async fn persist<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(value)?;

        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::storage(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::storage(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::storage(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %path.display(), "document persisted");
        Ok(())
    }

    async fn persist_records(&self, records: HashMap<String, SubdomainRecord>) -> Result<(), Error> {
        self.persist(&self.records_path, &RecordsDocument::new(records))
            .await
    }
}

#[async_trait]
impl RegistryStore for FileRegistryStore {
    async fn get_all(&self) -> Result<HashMap<String, SubdomainRecord>, Error> {
        self.load_records().await
    }

    async fn get(&self, subdomain: &str, tld: &str) -> Result<Option<SubdomainRecord>, Error> {
        let records = self.load_records().await?;
        Ok(records.get(&composite_key(subdomain, tld)).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<SubdomainRecord>, Error> {
        let records = self.load_records().await?;
        let mut matches: Vec<SubdomainRecord> = records
            .into_values()
            .filter(|record| record.matches(query))
            .collect();
        // Key order keeps results stable for identical input
        matches.sort_by_key(|record| record.key());
        Ok(matches)
    }

    async fn create(
        &self,
        subdomain: &str,
        tld: &str,
        fields: NewRecord,
    ) -> Result<SubdomainRecord, Error> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load_records().await?;
        let key = composite_key(subdomain, tld);

        if records.contains_key(&key) {
            return Err(Error::already_exists(key));
        }

        let record = SubdomainRecord::new(subdomain, tld, fields);
        records.insert(key.clone(), record.clone());
        self.persist_records(records).await?;

        tracing::debug!(key = %key, "record created");
        Ok(record)
    }

    async fn update(
        &self,
        subdomain: &str,
        tld: &str,
        patch: RecordPatch,
    ) -> Result<SubdomainRecord, Error> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load_records().await?;
        let key = composite_key(subdomain, tld);

        let record = records
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(key.clone()))?;
        record.apply(&patch);
        let updated = record.clone();

        self.persist_records(records).await?;

        tracing::debug!(key = %key, "record updated");
        Ok(updated)
    }

    async fn delete(&self, subdomain: &str, tld: &str) -> Result<bool, Error> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load_records().await?;
        let key = composite_key(subdomain, tld);

        if records.remove(&key).is_none() {
            return Ok(false);
        }

        self.persist_records(records).await?;

        tracing::debug!(key = %key, "record deleted");
        Ok(true)
    }

    async fn get_config(&self) -> Result<RegistryConfig, Error> {
        self.load_config().await
    }

    async fn update_config(&self, patch: ConfigPatch) -> Result<RegistryConfig, Error> {
        let _guard = self.write_lock.lock().await;

        let mut config = self.load_config().await?;
        config.apply(&patch);
        self.persist(&self.config_path, &config).await?;

        tracing::debug!("registry config updated");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn initializes_documents_on_first_use() {
        let dir = tempdir().unwrap();
        let store = FileRegistryStore::new(dir.path()).await.unwrap();

        assert!(dir.path().join(RECORDS_FILE).exists());
        assert!(dir.path().join(CONFIG_FILE).exists());

        assert!(store.get_all().await.unwrap().is_empty());
        assert_eq!(store.get_config().await.unwrap(), RegistryConfig::default());
    }

    #[tokio::test]
    async fn records_persist_across_instances() {
        let dir = tempdir().unwrap();

        {
            let store = FileRegistryStore::new(dir.path()).await.unwrap();
            store
                .create("shop", "com", NewRecord::default())
                .await
                .unwrap();
        }

        let store = FileRegistryStore::new(dir.path()).await.unwrap();
        let record = store.get("shop", "com").await.unwrap().unwrap();
        assert_eq!(record.subdomain, "shop");
        assert_eq!(record.tld, "com");
    }

    #[tokio::test]
    async fn corrupt_record_set_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let store = FileRegistryStore::new(dir.path()).await.unwrap();
        store
            .create("shop", "com", NewRecord::default())
            .await
            .unwrap();

        fs::write(dir.path().join(RECORDS_FILE), b"not json at all")
            .await
            .unwrap();

        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.get("shop", "com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_config_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let store = FileRegistryStore::new(dir.path()).await.unwrap();
        store
            .update_config(ConfigPatch {
                auto_dns: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        fs::write(dir.path().join(CONFIG_FILE), b"{{{").await.unwrap();

        let config = store.get_config().await.unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[tokio::test]
    async fn create_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = FileRegistryStore::new(dir.path()).await.unwrap();

        let fields = NewRecord {
            target: Some("1.2.3.4".to_string()),
            ..Default::default()
        };
        store.create("shop", "com", fields).await.unwrap();

        let second = NewRecord {
            target: Some("9.9.9.9".to_string()),
            ..Default::default()
        };
        let err = store.create("shop", "com", second).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(key) if key == "shop.com"));

        let record = store.get("shop", "com").await.unwrap().unwrap();
        assert_eq!(record.target, "1.2.3.4");
    }

    #[tokio::test]
    async fn config_update_is_a_merge() {
        let dir = tempdir().unwrap();
        let store = FileRegistryStore::new(dir.path()).await.unwrap();

        let config = store
            .update_config(ConfigPatch {
                default_target: Some("10.0.0.1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(config.default_target, "10.0.0.1");
        assert!(config.auto_dns);
        assert!(config.ssl_enabled);
    }

    #[tokio::test]
    async fn rapid_mutations_leave_consistent_state() {
        let dir = tempdir().unwrap();
        let store = FileRegistryStore::new(dir.path()).await.unwrap();

        for i in 0..10 {
            let fields = NewRecord {
                target: Some(format!("10.0.0.{i}")),
                ..Default::default()
            };
            store.create(&format!("host-{i}"), "net", fields).await.unwrap();
        }

        let reopened = FileRegistryStore::new(dir.path()).await.unwrap();
        assert_eq!(reopened.get_all().await.unwrap().len(), 10);
    }
}
