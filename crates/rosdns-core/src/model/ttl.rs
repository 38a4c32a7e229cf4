// # TTL Codec
//
// The store reports TTLs as compound durations: optional week, day, hour,
// minute and second segments in that order, e.g. `1w2d3h4m5s`. Older
// RouterOS releases print the sub-day part as a clock (`1d00:05:00`), and a
// bare integer is read as seconds.
//
// Outgoing TTLs are written as `<seconds>s`, which is itself a valid
// compound duration.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Segment units in their mandatory order, with their length in seconds
const UNITS: [(char, u64); 5] = [('w', WEEK), ('d', DAY), ('h', HOUR), ('m', MINUTE), ('s', 1)];

/// Record time-to-live in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(u64);

impl Ttl {
    /// Create a TTL from a number of seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Total duration in seconds
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// `true` when no TTL is set; such TTLs are left out of write payloads
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Parse a compound duration string into a TTL
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self(0));
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return parse_number(input, trimmed).map(Self);
        }

        let mut total: u64 = 0;
        // Index into UNITS of the next unit allowed to appear
        let mut next_unit = 0;
        let mut rest = trimmed;

        while !rest.is_empty() {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let (number, tail) = rest.split_at(digits);

            if tail.starts_with(':') {
                if next_unit > 2 {
                    return Err(Error::invalid_ttl(input, "clock after hour/minute/second segments"));
                }
                return parse_clock(input, rest).and_then(|clock| add(input, total, clock)).map(Self);
            }

            let Some(unit) = tail.chars().next() else {
                return Err(Error::invalid_ttl(input, format!("missing unit after {number}")));
            };
            if number.is_empty() {
                return Err(Error::invalid_ttl(input, format!("missing value before '{unit}'")));
            }
            let Some(position) = UNITS.iter().position(|(u, _)| *u == unit) else {
                return Err(Error::invalid_ttl(input, format!("unknown unit '{unit}'")));
            };
            if position < next_unit {
                return Err(Error::invalid_ttl(input, format!("unit '{unit}' out of order")));
            }

            let value = parse_number(input, number)?;
            let segment = value
                .checked_mul(UNITS[position].1)
                .ok_or_else(|| Error::invalid_ttl(input, "duration overflows"))?;
            total = add(input, total, segment)?;
            next_unit = position + 1;
            rest = &tail[unit.len_utf8()..];
        }

        Ok(Self(total))
    }

    /// TTL from a JSON value as the store sends it: a duration string, a
    /// number of seconds, or `null` for unset
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self(0)),
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n
                .as_u64()
                .map(Self)
                .ok_or_else(|| Error::invalid_ttl(n.to_string(), "not a whole number of seconds")),
            other => Err(Error::invalid_ttl(other.to_string(), "expected a duration or a number")),
        }
    }
}

fn parse_number(input: &str, digits: &str) -> Result<u64> {
    digits
        .parse::<u64>()
        .map_err(|e| Error::invalid_ttl(input, format!("bad number {digits:?}: {e}")))
}

fn add(input: &str, total: u64, segment: u64) -> Result<u64> {
    total
        .checked_add(segment)
        .ok_or_else(|| Error::invalid_ttl(input, "duration overflows"))
}

/// `H:MM:SS`, minutes and seconds below 60
fn parse_clock(input: &str, clock: &str) -> Result<u64> {
    let parts: Vec<&str> = clock.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(Error::invalid_ttl(input, "clock must be H:MM:SS"));
    };
    if [hours, minutes, seconds]
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(Error::invalid_ttl(input, "clock must be H:MM:SS"));
    }

    let hours = parse_number(input, hours)?;
    let minutes = parse_number(input, minutes)?;
    let seconds = parse_number(input, seconds)?;
    if minutes >= 60 || seconds >= 60 {
        return Err(Error::invalid_ttl(input, "clock minutes and seconds must be below 60"));
    }

    hours
        .checked_mul(HOUR)
        .and_then(|h| h.checked_add(minutes * MINUTE + seconds))
        .ok_or_else(|| Error::invalid_ttl(input, "duration overflows"))
}

impl FromStr for Ttl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u64> for Ttl {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct TtlVisitor;

impl Visitor<'_> for TtlVisitor {
    type Value = Ttl;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a compound duration such as \"1d2h\" or a number of seconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Ttl, E> {
        Ttl::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Ttl, E> {
        Ok(Ttl(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Ttl, E> {
        u64::try_from(v)
            .map(Ttl)
            .map_err(|_| E::custom(format!("negative TTL {v}")))
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(TtlVisitor)
    }
}
