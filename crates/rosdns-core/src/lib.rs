// # rosdns-core
//
// Core library of the RouterOS static-DNS webhook for external-dns.
//
// ## Architecture Overview
//
// - **Model**: store-side `Record`, controller-side `Endpoint`, `Changes`
//   and the compound-duration `Ttl`
// - **Translate**: grouping records into endpoints and expanding endpoints
//   back into records
// - **Reconcile**: attaching store identities to proposed endpoints
// - **SyncEngine**: serving reads, reconciliation and change application
//   against a `RecordStore`
// - **RecordStore**: trait for the router's static DNS table
//
// ## Design Principles
//
// 1. **No cached state**: every request reads the live table
// 2. **Plan before mutate**: a change set is fully translated before the
//    first store call
// 3. **Store-agnostic core**: HTTP and RouterOS specifics live in other crates

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod traits;
pub mod translate;

// Re-export core types for convenience
pub use config::{ServerConfig, StoreConfig, WebhookConfig};
pub use engine::{ApplySummary, StoreOperation, SyncEngine};
pub use error::{Error, ErrorKind, Result};
pub use model::{Changes, DomainFilter, Endpoint, Record, RecordType, Ttl};
pub use traits::RecordStore;
