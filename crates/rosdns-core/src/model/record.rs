//! Store-side record model
//!
//! A [`Record`] mirrors one entry of the router's static DNS table as the
//! REST API returns it. Only the target fields that belong to the record's
//! type are meaningful; the others stay `None` and are left out of write
//! payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Ttl;

/// Record types the webhook can translate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Name server
    Ns,
    /// Service locator
    Srv,
    /// Free-form text
    Txt,
    /// Mail exchange
    Mx,
}

impl RecordType {
    /// Every supported type
    pub const ALL: [RecordType; 7] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Ns,
        Self::Srv,
        Self::Txt,
        Self::Mx,
    ];

    /// Wire name of the type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Txt => "TXT",
            Self::Mx => "MX",
        }
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unsupported(s))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the static DNS table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identity, absent until the store creates the record
    #[serde(rename = ".id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// DNS name; empty for regexp-only entries
    #[serde(default)]
    pub name: String,

    /// Record type as the store spells it
    ///
    /// The store leaves `type` out for A records.
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,

    /// Time-to-live
    #[serde(default, skip_serializing_if = "Ttl::is_unset")]
    pub ttl: Ttl,

    /// A / AAAA target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// CNAME target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,

    /// NS target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,

    /// TXT target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "mx-preference", default, skip_serializing_if = "Option::is_none")]
    pub mx_preference: Option<String>,

    #[serde(rename = "mx-exchange", default, skip_serializing_if = "Option::is_none")]
    pub mx_exchange: Option<String>,

    #[serde(rename = "srv-priority", default, skip_serializing_if = "Option::is_none")]
    pub srv_priority: Option<String>,

    #[serde(rename = "srv-weight", default, skip_serializing_if = "Option::is_none")]
    pub srv_weight: Option<String>,

    #[serde(rename = "srv-port", default, skip_serializing_if = "Option::is_none")]
    pub srv_port: Option<String>,

    #[serde(rename = "srv-target", default, skip_serializing_if = "Option::is_none")]
    pub srv_target: Option<String>,
}

fn default_record_type() -> String {
    RecordType::A.as_str().to_string()
}

impl Record {
    /// Create an empty record of the given type
    pub fn new(name: impl Into<String>, record_type: RecordType, ttl: Ttl) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.as_str().to_string(),
            ttl,
            ..Self::default()
        }
    }

    /// Parsed record type, or [`Error::UnsupportedRecordType`]
    pub fn kind(&self) -> Result<RecordType> {
        self.record_type.parse()
    }

    /// Decode a record from the store's JSON
    ///
    /// A malformed `ttl` is reported as [`Error::InvalidTtl`]; anything else
    /// that does not fit is an [`Error::Json`].
    pub fn from_json(mut value: serde_json::Value) -> Result<Self> {
        let ttl = match value.as_object_mut().and_then(|fields| fields.remove("ttl")) {
            Some(raw) => Ttl::from_json(&raw)?,
            None => Ttl::default(),
        };
        let mut record: Self = serde_json::from_value(value)?;
        record.ttl = ttl;
        Ok(record)
    }

    /// Copy of this record without its identity, as sent in create and update bodies
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}
