// # Record Store Trait
//
// Defines the interface to the router's static DNS table.
//
// ## Implementations
//
// - RouterOS REST API: `rosdns-store-routeros` crate
//
// ## Usage
//
// ```rust,ignore
// use rosdns_core::RecordStore;
//
// async fn dump(store: &dyn RecordStore) -> rosdns_core::Result<()> {
//     for record in store.list_records().await? {
//         println!("{} {} {:?}", record.name, record.record_type, record.id);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::Record;

/// Trait for record store implementations
///
/// A store exposes four per-record primitives. Everything above them
/// (grouping, identity lookup, ordering of a change set) is owned by
/// [`SyncEngine`](crate::engine::SyncEngine).
///
/// # Thread Safety
///
/// Implementations must be thread-safe: the webhook serves requests
/// concurrently against one shared store.
///
/// # Constraints
///
/// - One remote call per invocation, no retries. A failed call is reported
///   and the engine aborts the request.
/// - No caching between calls. Every `list_records` reflects the live table.
/// - Non-success answers map to [`Error::Store`](crate::Error::Store),
///   connection failures to [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every record of the static DNS table in store order
    async fn list_records(&self) -> Result<Vec<Record>, crate::Error>;

    /// Create a record
    ///
    /// `record` carries no identity. Returns the record as stored, including
    /// the identity the store assigned.
    async fn create_record(&self, record: &Record) -> Result<Record, crate::Error>;

    /// Replace the fields of the record addressed by `id`
    async fn update_record(&self, id: &str, record: &Record) -> Result<(), crate::Error>;

    /// Delete the record addressed by `id`
    ///
    /// Deleting an unknown identity fails with a not-found store error
    /// (see [`Error::is_not_found`](crate::Error::is_not_found)).
    async fn delete_record(&self, id: &str) -> Result<(), crate::Error>;

    /// Store name, for logging
    fn store_name(&self) -> &'static str;
}
