//! DNS provider abstraction layer
//!
//! This module defines the zone and record types exchanged with the DNS
//! provider and the trait the orchestrator drives. The bunny.net client in
//! [`crate::bunny`] is the only production implementation.

use std::fmt;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DNS_RECORD_TYPE_A, DNS_RECORD_TYPE_AAAA};
use crate::error::Result;

//==============================================================================
// Types
//==============================================================================

/// Opaque provider identifier for a zone or record
///
/// bunny.net hands out numeric ids, but the id is never interpreted, so string
/// ids are accepted as well. Serialization keeps whichever form was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Numeric(u64),
    Text(String),
}

impl ResourceId {
    /// Parses an id from text, preferring the numeric form
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.parse::<u64>()
            .map(Self::Numeric)
            .unwrap_or_else(|_| Self::Text(raw.to_string()))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// DNS record type as numbered by bunny.net
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum RecordType {
    A,
    Aaaa,
    Other(u8),
}

impl From<u8> for RecordType {
    fn from(value: u8) -> Self {
        match value {
            DNS_RECORD_TYPE_A => Self::A,
            DNS_RECORD_TYPE_AAAA => Self::Aaaa,
            other => Self::Other(other),
        }
    }
}

impl From<RecordType> for u8 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => DNS_RECORD_TYPE_A,
            RecordType::Aaaa => DNS_RECORD_TYPE_AAAA,
            RecordType::Other(other) => other,
        }
    }
}

/// A DNS record inside a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsRecord {
    pub id: ResourceId,
    /// Record name relative to the zone; empty for the apex, `None` when the
    /// API sends `null`
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("@");
        write!(
            f,
            "DNS {:?} {} -> {} (ID: {})",
            self.record_type, name, self.value, self.id
        )
    }
}

/// A DNS zone with its records, in provider order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsZone {
    pub id: ResourceId,
    pub domain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub records: Vec<DnsRecord>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

//==============================================================================
// Trait
//==============================================================================

/// DNS provider operations needed by a run
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Lists every zone with its nested records
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ZoneListFailed`] when the listing request fails
    /// or its body cannot be decoded.
    async fn list_zones(&self) -> Result<Vec<DnsZone>>;

    /// Overwrites the value of an existing A record
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UpdateFailed`] on a non-success status or a
    /// transport failure.
    async fn upsert_a_record(
        &self,
        zone_id: &ResourceId,
        record_id: &ResourceId,
        ip: Ipv4Addr,
    ) -> Result<()>;
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_parse() {
        assert_eq!(ResourceId::parse("12345"), ResourceId::Numeric(12345));
        assert_eq!(ResourceId::parse(" 42 "), ResourceId::Numeric(42));
        assert_eq!(ResourceId::parse("Z1"), ResourceId::Text("Z1".to_string()));
    }

    #[test]
    fn test_resource_id_keeps_json_form() {
        let numeric: ResourceId = serde_json::from_str("123").unwrap();
        let text: ResourceId = serde_json::from_str("\"R1\"").unwrap();
        assert_eq!(numeric, ResourceId::Numeric(123));
        assert_eq!(text, ResourceId::Text("R1".to_string()));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "123");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"R1\"");
        assert_eq!(numeric.to_string(), "123");
    }

    #[test]
    fn test_record_type_mapping() {
        assert_eq!(RecordType::from(0), RecordType::A);
        assert_eq!(RecordType::from(1), RecordType::Aaaa);
        assert_eq!(RecordType::from(2), RecordType::Other(2));
        assert_eq!(u8::from(RecordType::A), 0);
        assert_eq!(u8::from(RecordType::Other(9)), 9);
    }

    #[test]
    fn test_zone_parsing() {
        let json = r#"{
            "Id": 101,
            "Domain": "example.com",
            "Records": [
                { "Id": 7, "Type": 0, "Name": "home", "Value": "203.0.113.5", "Ttl": 300 },
                { "Id": 8, "Type": 3, "Name": null, "Value": "v=spf1 -all" }
            ],
            "Nameserver1": "kiki.bunny.net"
        }"#;

        let zone: DnsZone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.id, ResourceId::Numeric(101));
        assert_eq!(zone.domain, "example.com");
        assert_eq!(zone.records.len(), 2);
        assert_eq!(zone.records[0].record_type, RecordType::A);
        assert_eq!(zone.records[1].record_type, RecordType::Other(3));
        assert_eq!(zone.records[0].name.as_deref(), Some("home"));
        assert_eq!(zone.records[1].name, None);
    }

    #[test]
    fn test_dns_record_display() {
        let record = DnsRecord {
            id: ResourceId::Numeric(7),
            name: Some(String::new()),
            record_type: RecordType::A,
            value: "203.0.113.5".to_string(),
        };

        let s = format!("{}", record);
        assert!(s.contains("@"));
        assert!(s.contains("203.0.113.5"));
        assert!(s.contains("ID: 7"));
    }
}
