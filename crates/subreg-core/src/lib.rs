// # subreg-core
//
// Core library for the subdomain registry service.
//
// ## Architecture Overview
//
// This library provides the authoritative registry of subdomain records:
// - **RegistryStore**: Trait for the persisted `(subdomain, tld) -> record` mapping
// - **DnsProvisioner**: Trait for mirroring registry changes to a remote DNS provider
// - **FileRegistryStore**: Durable JSON-document store with a single write lock
// - **MemoryRegistryStore**: Ephemeral store for tests and throwaway deployments
// - **validate**: Subdomain sanitization and RFC 1123 label validation
//
// ## Design Principles
//
// 1. **Single writer**: every mutation runs a full read-modify-persist cycle
//    under one mutual-exclusion lock
// 2. **Read-through**: state is re-read from durable storage on every
//    operation, never cached across calls
// 3. **Degrade, don't crash**: absent or corrupt storage falls back to a
//    documented default state
// 4. **Library-first**: the HTTP surface and the DNS provider integration are
//    thin collaborators around this crate

pub mod config;
pub mod error;
pub mod record;
pub mod store;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use config::{ConfigPatch, RegistryConfig};
pub use error::{Error, Result};
pub use record::{NewRecord, RecordPatch, SubdomainRecord, composite_key};
pub use store::{FileRegistryStore, MemoryRegistryStore};
pub use traits::{DnsProvisioner, RegistryStore, RemoteRecord};
