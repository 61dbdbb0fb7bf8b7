//! Counting test doubles for orchestrator tests

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bunnyddns::dns_provider::{DnsProvider, DnsRecord, DnsZone, RecordType, ResourceId};
use bunnyddns::resolver::PublicIpResolver;
use bunnyddns::state::DdnsState;
use bunnyddns::{Error, Result};

/// Resolver returning a fixed address, or exhaustion when given `None`
pub struct StaticResolver {
    ip: Option<Ipv4Addr>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new(ip: Option<Ipv4Addr>) -> Self {
        Self {
            ip,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublicIpResolver for StaticResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip.ok_or(Error::AllSourcesExhausted { attempted: 5 })
    }
}

/// Provider serving a fixed zone list and recording updates
pub struct MockDnsProvider {
    zones: Vec<DnsZone>,
    fail_updates: bool,
    list_calls: AtomicUsize,
    updates: Mutex<Vec<(ResourceId, ResourceId, Ipv4Addr)>>,
}

impl MockDnsProvider {
    pub fn new(zones: Vec<DnsZone>) -> Self {
        Self {
            zones,
            fail_updates: false,
            list_calls: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_updates(zones: Vec<DnsZone>) -> Self {
        Self {
            fail_updates: true,
            ..Self::new(zones)
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<(ResourceId, ResourceId, Ipv4Addr)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<DnsZone>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.clone())
    }

    async fn upsert_a_record(
        &self,
        zone_id: &ResourceId,
        record_id: &ResourceId,
        ip: Ipv4Addr,
    ) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((zone_id.clone(), record_id.clone(), ip));
        if self.fail_updates {
            return Err(Error::UpdateFailed {
                status: Some(500),
                reason: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

/// Zone `example.com` (id 11) with A record `home` (id 21)
pub fn example_zones() -> Vec<DnsZone> {
    vec![DnsZone {
        id: ResourceId::Numeric(11),
        domain: "example.com".to_string(),
        records: vec![DnsRecord {
            id: ResourceId::Numeric(21),
            name: Some("home".to_string()),
            record_type: RecordType::A,
            value: "192.0.2.1".to_string(),
        }],
    }]
}

pub fn state(current_ip: &str, with_ids: bool) -> DdnsState {
    DdnsState {
        current_ip: current_ip.to_string(),
        hostname: "home.example.com".to_string(),
        dns_zone_id: with_ids.then_some(ResourceId::Numeric(11)),
        dns_record_id: with_ids.then_some(ResourceId::Numeric(21)),
        last_updated: None,
    }
}
