//! Data model
//!
//! - [`Record`]: flat, single-target entry of the router's static DNS table
//! - [`Endpoint`]: grouped, multi-target resource exchanged with the controller
//! - [`Changes`]: create/update/delete diff computed by the controller
//! - [`Ttl`]: compound-duration TTL codec

pub mod endpoint;
pub mod record;
pub mod ttl;

pub use endpoint::{
    Changes, DomainFilter, Endpoint, ProviderSpecificProperty, STORE_ID_PROPERTY,
    WEBHOOK_MEDIA_TYPE,
};
pub use record::{Record, RecordType};
pub use ttl::Ttl;
