// # Webhook protocol types
//
// Controller-facing view of DNS data as exchanged over the external-dns
// webhook protocol.
//
// An endpoint with several targets is backed by one store record per
// target. Their identities travel on the wire as the single provider-specific
// property `.id`, comma-separated in target order (`*1,*2,*3`). Inside the
// crate they are lifted into `Endpoint::store_ids` so that no code has to
// search the property list for them; the conversion happens only at the
// serde boundary (`WireEndpoint`).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Provider-specific property carrying the store identities
pub const STORE_ID_PROPERTY: &str = ".id";

/// Separator between identities in the `.id` property
///
/// RouterOS identities are `*` followed by hex digits, so they never
/// contain it.
pub const STORE_ID_SEPARATOR: char = ',';

/// Media type of the webhook protocol
pub const WEBHOOK_MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// A provider-specific (name, value) pair attached to an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

impl ProviderSpecificProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One DNS resource as the controller sees it, keyed by (name, type)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireEndpoint", into = "WireEndpoint")]
pub struct Endpoint {
    /// DNS name
    pub dns_name: String,

    /// Record type (`A`, `SRV`, ...)
    pub record_type: String,

    /// Targets in encounter order
    pub targets: Vec<String>,

    /// TTL in seconds; 0 means "not configured"
    pub record_ttl: u64,

    /// Identities of the store records backing this endpoint
    ///
    /// `store_ids[i]` is the record holding `targets[i]`. There may be fewer
    /// identities than targets (targets not yet stored) or more (records
    /// about to be removed).
    pub store_ids: Vec<String>,

    /// Remaining provider-specific properties (never contains `.id`)
    pub provider_specific: Vec<ProviderSpecificProperty>,

    /// Set identifier, passed through untouched
    pub set_identifier: String,

    /// Labels, passed through untouched
    pub labels: BTreeMap<String, String>,
}

impl Endpoint {
    /// Create an endpoint without identity
    pub fn new(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        targets: Vec<String>,
        record_ttl: u64,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            record_type: record_type.into(),
            targets,
            record_ttl,
            ..Self::default()
        }
    }

    /// Attach store identities, in target order
    pub fn with_store_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEndpoint {
    dns_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    targets: Vec<String>,
    record_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    set_identifier: String,
    #[serde(rename = "recordTTL", default, skip_serializing_if = "is_zero")]
    record_ttl: u64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    provider_specific: Vec<ProviderSpecificProperty>,
}

/// Go encodes nil slices and maps as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(ttl: &u64) -> bool {
    *ttl == 0
}

impl From<WireEndpoint> for Endpoint {
    fn from(wire: WireEndpoint) -> Self {
        let mut store_ids = Vec::new();
        let mut provider_specific = Vec::with_capacity(wire.provider_specific.len());
        for property in wire.provider_specific {
            if property.name == STORE_ID_PROPERTY {
                store_ids = property
                    .value
                    .split(STORE_ID_SEPARATOR)
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
            } else {
                provider_specific.push(property);
            }
        }

        Self {
            dns_name: wire.dns_name,
            record_type: wire.record_type,
            targets: wire.targets,
            record_ttl: wire.record_ttl,
            store_ids,
            provider_specific,
            set_identifier: wire.set_identifier,
            labels: wire.labels,
        }
    }
}

impl From<Endpoint> for WireEndpoint {
    fn from(endpoint: Endpoint) -> Self {
        let mut provider_specific = Vec::with_capacity(endpoint.provider_specific.len() + 1);
        if !endpoint.store_ids.is_empty() {
            let joined = endpoint.store_ids.join(&STORE_ID_SEPARATOR.to_string());
            provider_specific.push(ProviderSpecificProperty::new(STORE_ID_PROPERTY, joined));
        }
        provider_specific.extend(endpoint.provider_specific);

        Self {
            dns_name: endpoint.dns_name,
            targets: endpoint.targets,
            record_type: endpoint.record_type,
            set_identifier: endpoint.set_identifier,
            record_ttl: endpoint.record_ttl,
            labels: endpoint.labels,
            provider_specific,
        }
    }
}

/// Change set computed by the controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    #[serde(default, alias = "Create", deserialize_with = "null_as_default")]
    pub create: Vec<Endpoint>,

    /// Previous state of updated endpoints; accepted but not used
    #[serde(default, alias = "UpdateOld", deserialize_with = "null_as_default")]
    pub update_old: Vec<Endpoint>,

    #[serde(default, alias = "UpdateNew", deserialize_with = "null_as_default")]
    pub update_new: Vec<Endpoint>,

    #[serde(default, alias = "Delete", deserialize_with = "null_as_default")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// `true` when there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update_new.is_empty() && self.delete.is_empty()
    }
}

/// Domain filter answered on `GET /`
///
/// The static DNS table has no zones, so the filter never restricts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}
