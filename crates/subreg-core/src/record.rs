//! Subdomain record data model
//!
//! A [`SubdomainRecord`] is one entry in the registry, uniquely identified by
//! its `(subdomain, tld)` pair. The pair is materialized as the composite key
//! `"{subdomain}.{tld}"` wherever records are stored or looked up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default record target when the caller supplies none
pub const DEFAULT_TARGET: &str = "0.0.0.0";

/// Default DNS record type when the caller supplies none
pub const DEFAULT_RECORD_TYPE: &str = "A";

/// Status assigned to freshly created records
pub const STATUS_ACTIVE: &str = "active";

/// Build the composite key identifying a record
pub fn composite_key(subdomain: &str, tld: &str) -> String {
    format!("{subdomain}.{tld}")
}

/// One registered subdomain
///
/// Timestamps are owned by the store: `created_at` and `updated_at` are set on
/// creation and `updated_at` is refreshed on every update, regardless of what
/// the caller supplies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdomainRecord {
    /// Normalized, RFC-1123-label-shaped subdomain
    pub subdomain: String,
    /// TLD code, one of the registry's allowed set
    pub tld: String,
    /// IP address or hostname, opaque to the store
    pub target: String,
    /// DNS record type (e.g. "A", "CNAME"), opaque to the store
    pub record_type: String,
    /// Whether SSL is enabled for this subdomain
    pub ssl_enabled: bool,
    /// Free-form status string, "active" on creation
    pub status: String,
    /// Identifier returned by the DNS provisioner, used for later
    /// update/delete of the remote record
    #[serde(default)]
    pub dns_record_id: Option<String>,
    /// Opaque caller-supplied metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update
    pub updated_at: DateTime<Utc>,
}

impl SubdomainRecord {
    /// Construct a record from caller-supplied fields merged over defaults
    ///
    /// # Visibility
    ///
    /// `pub(crate)` so that records can only come into existence through a
    /// store's `create`, which owns the uniqueness check and the timestamps.
    pub(crate) fn new(subdomain: &str, tld: &str, fields: NewRecord) -> Self {
        let now = Utc::now();
        Self {
            subdomain: subdomain.to_string(),
            tld: tld.to_string(),
            target: fields.target.unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            record_type: fields
                .record_type
                .unwrap_or_else(|| DEFAULT_RECORD_TYPE.to_string()),
            ssl_enabled: fields.ssl_enabled.unwrap_or(true),
            status: STATUS_ACTIVE.to_string(),
            dns_record_id: fields.dns_record_id,
            metadata: fields.metadata.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The composite key identifying this record
    pub fn key(&self) -> String {
        composite_key(&self.subdomain, &self.tld)
    }

    /// Case-insensitive substring match against the composite key or the
    /// JSON rendering of the full record
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if self.key().to_lowercase().contains(&query) {
            return true;
        }
        serde_json::to_string(self)
            .map(|rendered| rendered.to_lowercase().contains(&query))
            .unwrap_or(false)
    }

    /// Shallow-merge a patch into this record
    ///
    /// Provided fields replace the old value entirely; absent fields are left
    /// untouched. `updated_at` is refreshed unconditionally.
    pub(crate) fn apply(&mut self, patch: &RecordPatch) {
        if let Some(target) = &patch.target {
            self.target = target.clone();
        }
        if let Some(record_type) = &patch.record_type {
            self.record_type = record_type.clone();
        }
        if let Some(ssl_enabled) = patch.ssl_enabled {
            self.ssl_enabled = ssl_enabled;
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(metadata) = &patch.metadata {
            self.metadata = metadata.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Caller-supplied fields for record creation
///
/// Every field is optional; the store fills in documented defaults for absent
/// ones (`target = "0.0.0.0"`, `record_type = "A"`, `ssl_enabled = true`,
/// empty metadata).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecord {
    /// Record target (IP or hostname)
    pub target: Option<String>,
    /// DNS record type
    pub record_type: Option<String>,
    /// SSL flag
    pub ssl_enabled: Option<bool>,
    /// Provider record id, threaded in by the API layer after provisioning
    pub dns_record_id: Option<String>,
    /// Opaque metadata
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Partial-update structure for records
///
/// Only present fields overwrite; unknown fields are rejected at the
/// deserialization boundary rather than silently absorbed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordPatch {
    /// New target
    pub target: Option<String>,
    /// New record type
    pub record_type: Option<String>,
    /// New SSL flag
    pub ssl_enabled: Option<bool>,
    /// New status
    pub status: Option<String>,
    /// Replacement metadata mapping
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl RecordPatch {
    /// True if no field is set
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
            && self.record_type.is_none()
            && self.ssl_enabled.is_none()
            && self.status.is_none()
            && self.metadata.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied_on_creation() {
        let record = SubdomainRecord::new("shop", "com", NewRecord::default());

        assert_eq!(record.key(), "shop.com");
        assert_eq!(record.target, "0.0.0.0");
        assert_eq!(record.record_type, "A");
        assert!(record.ssl_enabled);
        assert_eq!(record.status, "active");
        assert!(record.dns_record_id.is_none());
        assert!(record.metadata.is_empty());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn supplied_fields_override_defaults() {
        let fields = NewRecord {
            target: Some("1.2.3.4".to_string()),
            record_type: Some("CNAME".to_string()),
            ssl_enabled: Some(false),
            dns_record_id: Some("cf-abc123".to_string()),
            metadata: None,
        };
        let record = SubdomainRecord::new("api", "dev", fields);

        assert_eq!(record.target, "1.2.3.4");
        assert_eq!(record.record_type, "CNAME");
        assert!(!record.ssl_enabled);
        assert_eq!(record.dns_record_id.as_deref(), Some("cf-abc123"));
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut record = SubdomainRecord::new("shop", "com", NewRecord::default());
        let before = record.clone();

        record.apply(&RecordPatch {
            status: Some("paused".to_string()),
            ..Default::default()
        });

        assert_eq!(record.status, "paused");
        assert_eq!(record.target, before.target);
        assert_eq!(record.record_type, before.record_type);
        assert_eq!(record.ssl_enabled, before.ssl_enabled);
        assert_eq!(record.metadata, before.metadata);
        assert_eq!(record.created_at, before.created_at);
        assert!(record.updated_at >= before.updated_at);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: std::result::Result<RecordPatch, _> =
            serde_json::from_str(r#"{"status": "paused", "owner": "mallory"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn matches_is_case_insensitive_over_key_and_fields() {
        let fields = NewRecord {
            target: Some("10.0.0.7".to_string()),
            ..Default::default()
        };
        let record = SubdomainRecord::new("shop", "com", fields);

        assert!(record.matches("SHOP"));
        assert!(record.matches("shop.com"));
        assert!(record.matches("10.0.0.7"));
        assert!(!record.matches("blog"));
    }
}
