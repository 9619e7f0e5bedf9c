// # DNS Provisioner Trait
//
// Defines the interface for mirroring registry changes to a remote DNS
// provider's HTTP API.
//
// ## Contract
//
// Provisioner calls are best-effort network operations with a bounded
// timeout. The API layer invokes them outside the registry store's lock and
// never rolls back a store mutation because a provisioner call failed: the
// registry record and the remote DNS state may diverge, and reconciliation
// is out of scope.
//
// Implementations must stay stateless and single-shot:
// - No retry or backoff logic (callers decide whether to retry)
// - No caching between requests
// - No background tasks
// - No access to the registry store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS record as reported by the remote provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record content (typically the target address)
    pub content: String,
    /// DNS record type
    #[serde(rename = "type")]
    pub record_type: String,
}

/// Trait for DNS provisioner implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvisioner: Send + Sync {
    /// Create a record at the remote provider
    ///
    /// Returns the provider's view of the created record, including the
    /// identifier needed for later update/delete.
    async fn create_record(
        &self,
        fqdn: &str,
        tld: &str,
        target: &str,
        record_type: &str,
    ) -> crate::Result<RemoteRecord>;

    /// Update an existing remote record's target
    async fn update_record(
        &self,
        fqdn: &str,
        tld: &str,
        target: &str,
        record_id: &str,
    ) -> crate::Result<()>;

    /// Delete a remote record by provider identifier
    async fn delete_record(&self, tld: &str, record_id: &str) -> crate::Result<()>;

    /// List every remote record in the zone backing the given TLD
    async fn list_records(&self, tld: &str) -> crate::Result<Vec<RemoteRecord>>;

    /// Provider name for logging and diagnostics
    fn provider_name(&self) -> &'static str;
}
