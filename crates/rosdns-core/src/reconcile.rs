//! Identity reconciliation
//!
//! The controller never sees store identities unless it read them back, so
//! endpoints it proposes arrive without `.id`. Reconciliation groups the live
//! records exactly as the read path does and attaches every identity of the
//! matching (name, type), in store order. Read and reconciled views of the
//! same table therefore carry the same identities.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{Endpoint, Record};
use crate::translate::{RecordKey, records_to_endpoints};

/// Attach store identities to proposed endpoints
///
/// Matched endpoints lose every other provider-specific property. Unmatched
/// endpoints pass through unchanged. Order is preserved.
pub fn adjust_endpoints(endpoints: Vec<Endpoint>, live: &[Record]) -> Vec<Endpoint> {
    let current = records_to_endpoints(live);
    let live_ids: HashMap<RecordKey, &[String]> = current
        .iter()
        .filter(|endpoint| !endpoint.store_ids.is_empty())
        .map(|endpoint| (RecordKey::of_endpoint(endpoint), endpoint.store_ids.as_slice()))
        .collect();

    endpoints
        .into_iter()
        .map(|mut endpoint| {
            match live_ids.get(&RecordKey::of_endpoint(&endpoint)) {
                Some(ids) => {
                    endpoint.store_ids = ids.to_vec();
                    endpoint.provider_specific.clear();
                }
                None => debug!(
                    "No live record for {} ({}), leaving endpoint without identity",
                    endpoint.dns_name, endpoint.record_type
                ),
            }
            endpoint
        })
        .collect()
}
