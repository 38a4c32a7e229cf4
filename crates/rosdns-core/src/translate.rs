//! Record/Endpoint translation
//!
//! ## Read path
//!
//! Records are grouped by (name, type). The first record of a key creates the
//! endpoint; every record appends its target and its store identity, so
//! `targets` and `store_ids` stay aligned. When records of one key disagree on
//! TTL the endpoint keeps the smallest. Records the webhook cannot express are
//! skipped with a warning.
//!
//! ## Write path
//!
//! Each target of an endpoint becomes one record carrying that target, the
//! endpoint's name, type and TTL, and the identity at the same position.
//! Any target that does not decode for its type fails the whole conversion.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{Endpoint, Record, RecordType, Ttl};

impl RecordType {
    /// Target string of `record`, or `None` if its field group is incomplete
    pub fn encode_target(self, record: &Record) -> Option<String> {
        match self {
            Self::A | Self::Aaaa => record.address.clone(),
            Self::Cname => record.cname.clone(),
            Self::Ns => record.ns.clone(),
            Self::Txt => record.text.clone(),
            Self::Srv => Some(format!(
                "{} {} {} {}",
                record.srv_priority.as_deref()?,
                record.srv_weight.as_deref()?,
                record.srv_port.as_deref()?,
                record.srv_target.as_deref()?,
            )),
            Self::Mx => Some(format!(
                "{} {}",
                record.mx_preference.as_deref()?,
                record.mx_exchange.as_deref()?,
            )),
        }
    }

    /// Populate the target fields of `record` from `target`
    pub fn decode_target(self, target: &str, record: &mut Record) -> Result<()> {
        match self {
            Self::A | Self::Aaaa => record.address = Some(target.to_string()),
            Self::Cname => record.cname = Some(target.to_string()),
            Self::Ns => record.ns = Some(target.to_string()),
            Self::Txt => record.text = Some(target.to_string()),
            Self::Srv => {
                let [priority, weight, port, srv_target] = self.split_fields::<4>(target)?;
                record.srv_priority = Some(self.numeric_field(target, "priority", priority)?);
                record.srv_weight = Some(self.numeric_field(target, "weight", weight)?);
                record.srv_port = Some(self.numeric_field(target, "port", port)?);
                record.srv_target = Some(srv_target.to_string());
            }
            Self::Mx => {
                let [preference, exchange] = self.split_fields::<2>(target)?;
                record.mx_preference = Some(self.numeric_field(target, "preference", preference)?);
                record.mx_exchange = Some(exchange.to_string());
            }
        }
        Ok(())
    }

    fn split_fields<const N: usize>(self, target: &str) -> Result<[&str; N]> {
        let fields: Vec<&str> = target.split_whitespace().collect();
        let count = fields.len();
        fields.try_into().map_err(|_| {
            Error::invalid_target(
                self.as_str(),
                target,
                format!("expected {N} space-separated fields, got {count}"),
            )
        })
    }

    fn numeric_field(self, target: &str, field: &str, value: &str) -> Result<String> {
        value
            .parse::<u16>()
            .map(|n| n.to_string())
            .map_err(|_| Error::invalid_target(self.as_str(), target, format!("{field} {value:?} is not a number")))
    }
}

/// Grouping key shared by translation and reconciliation
///
/// Names compare case-insensitively and without a trailing dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecordKey {
    name: String,
    record_type: String,
}

impl RecordKey {
    pub(crate) fn new(name: &str, record_type: &str) -> Self {
        Self {
            name: name.trim_end_matches('.').to_ascii_lowercase(),
            record_type: record_type.to_ascii_uppercase(),
        }
    }

    pub(crate) fn of_record(record: &Record) -> Self {
        Self::new(&record.name, &record.record_type)
    }

    pub(crate) fn of_endpoint(endpoint: &Endpoint) -> Self {
        Self::new(&endpoint.dns_name, &endpoint.record_type)
    }
}

/// Group store records into endpoints
///
/// Endpoints come out in the order their first record was encountered.
pub fn records_to_endpoints(records: &[Record]) -> Vec<Endpoint> {
    let mut endpoints: Vec<Endpoint> = Vec::new();
    let mut index: HashMap<RecordKey, usize> = HashMap::new();

    for record in records {
        let Ok(kind) = record.kind() else {
            warn!(name = %record.name, record_type = %record.record_type, "Skipping record with unsupported type");
            continue;
        };
        if record.name.is_empty() {
            warn!(id = ?record.id, "Skipping record without a name");
            continue;
        }
        let Some(target) = kind.encode_target(record) else {
            warn!(name = %record.name, record_type = %kind, "Skipping record with incomplete target");
            continue;
        };

        let ttl = record.ttl.as_secs();
        match index.entry(RecordKey::new(&record.name, kind.as_str())) {
            Entry::Occupied(slot) => {
                let endpoint = &mut endpoints[*slot.get()];
                endpoint.targets.push(target);
                endpoint.store_ids.extend(record.id.clone());
                endpoint.record_ttl = endpoint.record_ttl.min(ttl);
            }
            Entry::Vacant(slot) => {
                slot.insert(endpoints.len());
                let endpoint = Endpoint::new(record.name.clone(), kind.as_str(), vec![target], ttl)
                    .with_store_ids(record.id.clone());
                endpoints.push(endpoint);
            }
        }
    }

    endpoints
}

/// Expand one endpoint into store records, one per target
///
/// The record for `targets[i]` carries `store_ids[i]`, or no identity when
/// the endpoint has fewer identities than targets.
pub fn endpoint_to_records(endpoint: &Endpoint) -> Result<Vec<Record>> {
    let kind: RecordType = endpoint.record_type.parse()?;
    let ttl = Ttl::from_secs(endpoint.record_ttl);

    endpoint
        .targets
        .iter()
        .enumerate()
        .map(|(position, target)| {
            let mut record = Record::new(endpoint.dns_name.clone(), kind, ttl);
            record.id = endpoint.store_ids.get(position).cloned();
            kind.decode_target(target, &mut record)?;
            Ok(record)
        })
        .collect()
}

/// Expand endpoints into store records; fails without partial output
pub fn endpoints_to_records(endpoints: &[Endpoint]) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for endpoint in endpoints {
        records.extend(endpoint_to_records(endpoint)?);
    }
    Ok(records)
}
