// # Registry Store Trait
//
// Defines the interface for the persisted subdomain registry.
//
// ## Purpose
//
// The store owns the canonical copy of every record and the registry
// configuration document. It enforces key uniqueness and serializes all
// mutations against durable storage.
//
// ## Contract
//
// - Callers receive owned values, never references into store internals.
// - `create` fails on an existing key; it never overwrites.
// - `update` merges only the supplied fields and fails on an absent key.
// - `delete` reports whether a deletion occurred and is silent when absent.
// - Reads reflect the latest completed write and never observe a
//   partially-written state.
//
// The store trusts its callers to have sanitized and validated subdomain
// input (see `crate::validate`); it does not re-validate internally.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::{ConfigPatch, RegistryConfig};
use crate::record::{NewRecord, RecordPatch, SubdomainRecord};

/// Trait for registry store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Implementations serialize mutations internally; two concurrent creates of
/// the same key must never both succeed.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Every persisted record, keyed by composite key
    async fn get_all(&self) -> crate::Result<HashMap<String, SubdomainRecord>>;

    /// Exact lookup by `(subdomain, tld)`
    ///
    /// Returns `Ok(None)` when the key is absent.
    async fn get(&self, subdomain: &str, tld: &str) -> crate::Result<Option<SubdomainRecord>>;

    /// Case-insensitive substring search against composite keys and record
    /// field renderings
    ///
    /// Order is unspecified but stable for identical input.
    async fn search(&self, query: &str) -> crate::Result<Vec<SubdomainRecord>>;

    /// Create a new record with defaults merged over the supplied fields
    ///
    /// Fails with [`crate::Error::AlreadyExists`] if the key is registered;
    /// the existing record is left unmodified.
    async fn create(
        &self,
        subdomain: &str,
        tld: &str,
        fields: NewRecord,
    ) -> crate::Result<SubdomainRecord>;

    /// Shallow-merge the supplied fields into an existing record
    ///
    /// `updated_at` is refreshed unconditionally. Fails with
    /// [`crate::Error::NotFound`] if the key is absent; the absent key is not
    /// created.
    async fn update(
        &self,
        subdomain: &str,
        tld: &str,
        patch: RecordPatch,
    ) -> crate::Result<SubdomainRecord>;

    /// Remove the record if present
    ///
    /// Returns whether a deletion occurred; an absent key yields `Ok(false)`,
    /// not an error.
    async fn delete(&self, subdomain: &str, tld: &str) -> crate::Result<bool>;

    /// The registry configuration document
    async fn get_config(&self) -> crate::Result<RegistryConfig>;

    /// Merge the supplied fields into the configuration document
    async fn update_config(&self, patch: ConfigPatch) -> crate::Result<RegistryConfig>;
}
