//! Test doubles and common utilities for contract tests
//!
//! [`MockRecordStore`] keeps a static DNS table in memory and behaves like
//! the router for the calls the engine makes: identities are allocated on
//! create and unknown identities answer 404.

#![allow(dead_code)]

use rosdns_core::error::{Error, Result};
use rosdns_core::{Record, RecordStore, RecordType, Ttl};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An in-memory RecordStore that tracks calls
pub struct MockRecordStore {
    /// Current table contents in store order
    records: Arc<Mutex<Vec<Record>>>,
    /// Source of `*N` identities
    next_id: Arc<AtomicUsize>,
    /// Call counter for list_records()
    list_call_count: Arc<AtomicUsize>,
    /// Mutations in call order, e.g. `create api.example.com`, `delete *1`
    mutations: Arc<Mutex<Vec<String>>>,
    /// Mutations touching this name fail with HTTP 500
    failing_name: Arc<Mutex<Option<String>>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a store pre-filled with `records`
    ///
    /// Records without identity are assigned one.
    pub fn with_records(records: Vec<Record>) -> Self {
        let next_id = Arc::new(AtomicUsize::new(1));
        let records = records
            .into_iter()
            .map(|mut record| {
                if record.id.is_none() {
                    record.id = Some(allocate_id(&next_id));
                }
                record
            })
            .collect();

        Self {
            records: Arc::new(Mutex::new(records)),
            next_id,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            mutations: Arc::new(Mutex::new(Vec::new())),
            failing_name: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a new MockRecordStore that shares table and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            next_id: Arc::clone(&other.next_id),
            list_call_count: Arc::clone(&other.list_call_count),
            mutations: Arc::clone(&other.mutations),
            failing_name: Arc::clone(&other.failing_name),
        }
    }

    /// Make every mutation of `name` fail
    pub fn fail_on(&self, name: &str) {
        *self.failing_name.lock().unwrap() = Some(name.to_string());
    }

    /// Snapshot of the table
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Mutations in call order
    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    fn check_failure(&self, operation: &'static str, name: &str) -> Result<()> {
        if self.failing_name.lock().unwrap().as_deref() == Some(name) {
            return Err(Error::Store {
                operation,
                status: 500,
                code: Some(500),
                message: "Internal Server Error".to_string(),
                detail: Some(format!("{name} is locked")),
            });
        }
        Ok(())
    }
}

fn allocate_id(next_id: &AtomicUsize) -> String {
    format!("*{:X}", next_id.fetch_add(1, Ordering::SeqCst))
}

fn not_found(operation: &'static str) -> Error {
    Error::Store {
        operation,
        status: 404,
        code: Some(404),
        message: "Not Found".to_string(),
        detail: Some("no such item".to_string()),
    }
}

#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn list_records(&self) -> Result<Vec<Record>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.records())
    }

    async fn create_record(&self, record: &Record) -> Result<Record> {
        self.check_failure("create", &record.name)?;
        self.mutations
            .lock()
            .unwrap()
            .push(format!("create {}", record.name));

        let mut created = record.clone();
        created.id = Some(allocate_id(&self.next_id));
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_record(&self, id: &str, record: &Record) -> Result<()> {
        self.check_failure("update", &record.name)?;
        self.mutations.lock().unwrap().push(format!("update {id}"));

        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| not_found("update"))?;
        *slot = Record {
            id: Some(id.to_string()),
            ..record.clone()
        };
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        let name = self
            .records()
            .into_iter()
            .find(|r| r.id.as_deref() == Some(id))
            .map(|r| r.name);
        if let Some(name) = &name {
            self.check_failure("delete", name)?;
        }
        self.mutations.lock().unwrap().push(format!("delete {id}"));

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id.as_deref() != Some(id));
        if records.len() == before {
            return Err(not_found("delete"));
        }
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to build an A record without identity
pub fn a_record(name: &str, address: &str, ttl: u64) -> Record {
    Record {
        address: Some(address.to_string()),
        ..Record::new(name, RecordType::A, Ttl::from_secs(ttl))
    }
}
