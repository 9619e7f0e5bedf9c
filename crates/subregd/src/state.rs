//! Shared application state for request handlers
//!
//! Built once at the composition root in `main` and cloned into every
//! handler. The registry store and the provisioner are injected as trait
//! objects; handlers never construct their own.

use std::collections::HashMap;
use std::sync::Arc;

use subreg_core::traits::{DnsProvisioner, RegistryStore};

/// State shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    /// The authoritative registry store
    pub store: Arc<dyn RegistryStore>,
    /// DNS provisioner, absent when no provider credentials are configured
    pub provisioner: Option<Arc<dyn DnsProvisioner>>,
    /// Base domain per TLD code (e.g. "com" -> "example.com")
    pub base_domains: HashMap<String, String>,
}

impl AppState {
    /// The base domain backing a TLD code, if one is configured
    pub fn base_domain(&self, tld: &str) -> Option<&str> {
        self.base_domains.get(tld).map(String::as_str)
    }

    /// Fully qualified name for a subdomain under a TLD's base domain
    pub fn fqdn(&self, subdomain: &str, tld: &str) -> Option<String> {
        self.base_domain(tld)
            .map(|base| format!("{subdomain}.{base}"))
    }
}
