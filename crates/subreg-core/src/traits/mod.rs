//! Core traits for the subdomain registry
//!
//! This module defines the abstract interfaces at the system's seams.
//!
//! - [`RegistryStore`]: the authoritative `(subdomain, tld) -> record` mapping
//! - [`DnsProvisioner`]: mirror registry changes to a remote DNS provider

pub mod dns_provisioner;
pub mod registry_store;

pub use dns_provisioner::{DnsProvisioner, RemoteRecord};
pub use registry_store::RegistryStore;
