//! Change planning
//!
//! A change set is turned into the full list of store calls before the first
//! call is made, so a change set that cannot be translated leaves the store
//! untouched.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::model::{Changes, Endpoint, Record};
use crate::translate::endpoint_to_records;

/// One store call of an apply request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// Create a record; the record carries no identity
    Create(Record),

    /// Delete the record addressed by `id`
    Delete {
        id: String,
        /// DNS name, for logging
        name: String,
    },

    /// Replace the record addressed by `id` with `record`
    Update { id: String, record: Record },
}

impl StoreOperation {
    /// Operation name, for logging
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Delete { .. } => "delete",
            Self::Update { .. } => "update",
        }
    }
}

/// Store calls of one change set, grouped by phase
#[derive(Default)]
struct Plan {
    creates: Vec<StoreOperation>,
    deletes: Vec<StoreOperation>,
    updates: Vec<StoreOperation>,
    /// Identities already scheduled for deletion
    deleted: HashSet<String>,
}

impl Plan {
    fn create(&mut self, record: Record) {
        self.creates.push(StoreOperation::Create(record.without_id()));
    }

    fn delete(&mut self, id: &str, name: &str) {
        if self.deleted.insert(id.to_string()) {
            self.deletes.push(StoreOperation::Delete {
                id: id.to_string(),
                name: name.to_string(),
            });
        }
    }

    fn update(&mut self, id: String, record: Record) {
        self.updates.push(StoreOperation::Update {
            id,
            record: record.without_id(),
        });
    }

    fn into_operations(self) -> Vec<StoreOperation> {
        let mut operations = self.creates;
        operations.extend(self.deletes);
        operations.extend(self.updates);
        operations
    }
}

/// Translate a change set into store calls
///
/// Calls come out as all creates, then all deletes, then all updates, each in
/// change-set order. Deletes are issued once per distinct identity.
///
/// An updated endpoint pairs its targets with its identities by position:
/// paired records are patched, targets past the last identity are created
/// and identities past the last target are deleted.
pub fn plan_changes(changes: &Changes) -> Result<Vec<StoreOperation>> {
    let mut plan = Plan::default();

    for endpoint in &changes.create {
        for record in endpoint_to_records(endpoint)? {
            plan.create(record);
        }
    }

    for endpoint in &changes.delete {
        // An untranslatable endpoint fails the plan even when only deleted
        endpoint_to_records(endpoint)?;
        for id in identities(endpoint)? {
            plan.delete(id, &endpoint.dns_name);
        }
    }

    for endpoint in &changes.update_new {
        let records = endpoint_to_records(endpoint)?;
        let ids = identities(endpoint)?;
        for record in records {
            match record.id.clone() {
                Some(id) => plan.update(id, record),
                None => plan.create(record),
            }
        }
        for id in ids.iter().skip(endpoint.targets.len()) {
            plan.delete(id, &endpoint.dns_name);
        }
    }

    Ok(plan.into_operations())
}

/// Identities of an endpoint that addresses existing records
///
/// At least one is required and none may repeat.
fn identities(endpoint: &Endpoint) -> Result<&[String]> {
    if endpoint.store_ids.is_empty() {
        return Err(Error::missing_identity(&endpoint.dns_name, &endpoint.record_type));
    }

    let mut seen = HashSet::new();
    if let Some(id) = endpoint.store_ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(Error::ambiguous_identity(&endpoint.dns_name, &endpoint.record_type, id));
    }

    Ok(&endpoint.store_ids)
}
