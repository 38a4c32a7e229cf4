//! Sync engine
//!
//! The SyncEngine serves the three webhook operations against one
//! [`RecordStore`]:
//! - reading the live table as endpoints
//! - attaching store identities to proposed endpoints
//! - applying a change set
//!
//! ## Architecture
//!
//! ```text
//!   GET /records          POST /adjustendpoints       POST /records
//!        │                        │                         │
//!        ▼                        ▼                         ▼
//! ┌──────────────┐        ┌──────────────┐          ┌──────────────┐
//! │  translate   │        │  reconcile   │          │     plan     │
//! └──────────────┘        └──────────────┘          └──────────────┘
//!        │                        │                         │
//!        └──────── list ──────────┴── create/delete/update ─┘
//!                                 ▼
//!                         ┌──────────────┐
//!                         │ RecordStore  │
//!                         └──────────────┘
//! ```
//!
//! ## Apply Flow
//!
//! 1. Translate the whole change set into store operations
//! 2. Run creates, then deletes, then updates
//! 3. Stop at the first failing call; earlier calls stay applied

pub mod plan;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::Result;
use crate::model::{Changes, Endpoint};
use crate::reconcile;
use crate::traits::RecordStore;
use crate::translate;

pub use plan::{StoreOperation, plan_changes};

/// Counts of store calls made by a successful apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub deleted: usize,
    pub updated: usize,
}

impl ApplySummary {
    /// Total number of store calls
    pub fn total(&self) -> usize {
        self.created + self.deleted + self.updated
    }

    fn count(&mut self, operation: &StoreOperation) {
        match operation {
            StoreOperation::Create(_) => self.created += 1,
            StoreOperation::Delete { .. } => self.deleted += 1,
            StoreOperation::Update { .. } => self.updated += 1,
        }
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} deleted, {} updated",
            self.created, self.deleted, self.updated
        )
    }
}

/// Core sync engine
///
/// Holds no state besides the store handle; every call re-reads the live
/// table. Cloning is cheap and clones share the store.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn RecordStore>,
}

impl SyncEngine {
    /// Create an engine over `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }

    /// Current records of the store, grouped into endpoints
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        let records = self.store.list_records().await?;
        let endpoints = translate::records_to_endpoints(&records);
        debug!(
            "Read {} records from {} as {} endpoints",
            records.len(),
            self.store.store_name(),
            endpoints.len()
        );
        Ok(endpoints)
    }

    /// Attach store identities to proposed endpoints
    pub async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>> {
        let live = self.store.list_records().await?;
        Ok(reconcile::adjust_endpoints(endpoints, &live))
    }

    /// Apply a change set
    ///
    /// Fails before touching the store if any endpoint cannot be translated.
    /// Otherwise fails at the first store call that fails, leaving earlier
    /// calls applied.
    pub async fn apply_changes(&self, changes: &Changes) -> Result<ApplySummary> {
        if changes.is_empty() {
            debug!("Empty change set, nothing to apply");
            return Ok(ApplySummary::default());
        }

        let operations = plan_changes(changes)?;
        let mut summary = ApplySummary::default();

        for (index, operation) in operations.iter().enumerate() {
            if let Err(e) = self.execute(operation).await {
                error!(
                    "Apply aborted at {} {} of {}: {}",
                    operation.verb(),
                    index + 1,
                    operations.len(),
                    e
                );
                return Err(e);
            }
            summary.count(operation);
        }

        info!("Applied changes to {}: {}", self.store.store_name(), summary);
        Ok(summary)
    }

    async fn execute(&self, operation: &StoreOperation) -> Result<()> {
        match operation {
            StoreOperation::Create(record) => {
                let created = self.store.create_record(record).await?;
                info!(
                    "Created {} {} (id {})",
                    record.record_type,
                    record.name,
                    created.id.as_deref().unwrap_or("?")
                );
            }
            StoreOperation::Delete { id, name } => {
                self.store.delete_record(id).await?;
                info!("Deleted {} (id {})", name, id);
            }
            StoreOperation::Update { id, record } => {
                self.store.update_record(id, record).await?;
                info!("Updated {} {} (id {})", record.record_type, record.name, id);
            }
        }
        Ok(())
    }
}
