//! Zone and record discovery
//!
//! Finds the zone and A record ids for a hostname by matching it against the
//! provider's zone list. Matching is by case-insensitive substring: a zone
//! matches when its domain occurs in the hostname, a record when its name does.
//! The first match in provider order wins. A record with a `null` name never
//! matches; an empty name (the zone apex) matches every host in the zone.

use tracing::{debug, info};

use crate::dns_provider::{DnsProvider, DnsZone, RecordType, ResourceId};
use crate::error::{Error, Result};

/// Zone and record ids of the record kept up to date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIds {
    pub zone_id: ResourceId,
    pub record_id: ResourceId,
}

/// Matches a hostname against a zone list
///
/// # Errors
///
/// - [`Error::ZoneNotFound`] when no zone domain occurs in the hostname
/// - [`Error::RecordNotFound`] when the first matching zone has no A record
///   whose name occurs in the hostname
pub fn match_record(zones: &[DnsZone], hostname: &str) -> Result<RecordIds> {
    let hostname = hostname.to_ascii_lowercase();

    let zone = zones
        .iter()
        .find(|zone| hostname.contains(&zone.domain.to_ascii_lowercase()))
        .ok_or_else(|| Error::ZoneNotFound {
            hostname: hostname.clone(),
        })?;
    debug!("Matched zone {} (ID: {})", zone.domain, zone.id);

    let record = zone
        .records
        .iter()
        .find(|record| {
            record.record_type == RecordType::A
                && record
                    .name
                    .as_deref()
                    .is_some_and(|name| hostname.contains(&name.to_ascii_lowercase()))
        })
        .ok_or_else(|| Error::RecordNotFound {
            hostname: hostname.clone(),
            zone_id: zone.id.to_string(),
        })?;
    debug!("Matched record {}", record);

    Ok(RecordIds {
        zone_id: zone.id.clone(),
        record_id: record.id.clone(),
    })
}

/// Lists the provider's zones and matches the hostname against them
///
/// Nothing is persisted here; the caller stores the returned ids.
pub async fn discover(provider: &dyn DnsProvider, hostname: &str) -> Result<RecordIds> {
    let zones = provider.list_zones().await?;
    debug!("Provider returned {} zones", zones.len());

    let ids = match_record(&zones, hostname)?;
    info!(
        "DNS zone lookup succeeded | ZONE {} | RECORD {}",
        ids.zone_id, ids.record_id
    );
    Ok(ids)
}
