//! Core traits
//!
//! - [`RecordStore`]: CRUD access to the router's static DNS table

pub mod record_store;

pub use record_store::RecordStore;
