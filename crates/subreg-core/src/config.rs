//! Registry-wide configuration document
//!
//! A single process-wide document, persisted independently of individual
//! records. Callers read it before deciding whether to invoke the DNS
//! provisioner; it is mutated only through an explicit merge update.

use serde::{Deserialize, Serialize};

/// TLD codes accepted by a freshly initialized registry
pub const DEFAULT_ALLOWED_TLDS: [&str; 5] = ["net", "com", "zw", "dev", "id"];

/// The registry configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Target assigned to records created without one
    pub default_target: String,
    /// Default SSL policy for new records
    pub ssl_enabled: bool,
    /// Whether creates should attempt DNS provisioning
    pub auto_dns: bool,
    /// TLD codes the registry accepts
    pub allowed_tlds: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_target: "0.0.0.0".to_string(),
            ssl_enabled: true,
            auto_dns: true,
            allowed_tlds: DEFAULT_ALLOWED_TLDS
                .iter()
                .map(|tld| tld.to_string())
                .collect(),
        }
    }
}

impl RegistryConfig {
    /// Whether the given TLD code is in the allowed set
    pub fn allows_tld(&self, tld: &str) -> bool {
        self.allowed_tlds.iter().any(|allowed| allowed == tld)
    }

    /// Shallow-merge a patch into this document
    pub(crate) fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(default_target) = &patch.default_target {
            self.default_target = default_target.clone();
        }
        if let Some(ssl_enabled) = patch.ssl_enabled {
            self.ssl_enabled = ssl_enabled;
        }
        if let Some(auto_dns) = patch.auto_dns {
            self.auto_dns = auto_dns;
        }
        if let Some(allowed_tlds) = &patch.allowed_tlds {
            self.allowed_tlds = allowed_tlds.clone();
        }
    }
}

/// Partial-update structure for the configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    /// New default target
    pub default_target: Option<String>,
    /// New default SSL policy
    pub ssl_enabled: Option<bool>,
    /// New auto-provisioning policy
    pub auto_dns: Option<bool>,
    /// Replacement allowed-TLD set
    pub allowed_tlds: Option<Vec<String>>,
}
