//! Orchestrator module for bunnyddns
//!
//! Drives a single run: make sure the record ids are known, resolve the public
//! IPv4 address, and push it to bunny.net only when it differs from the stored
//! one. The run state is passed in by value and handed back updated.

use std::fmt;
use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::discovery::{discover, RecordIds};
use crate::dns_provider::DnsProvider;
use crate::error::Result;
use crate::resolver::PublicIpResolver;
use crate::state::{DdnsState, StateStore};

/// Placeholder substituted for secrets in log lines
const REDACTED: &str = "***REDACTED***";

//==============================================================================
// Outcome
//==============================================================================

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The resolved address matched the stored one; nothing was sent
    Unchanged(Ipv4Addr),
    /// The record was updated
    Updated {
        /// Previously stored address, `None` on the first run
        previous: Option<Ipv4Addr>,
        current: Ipv4Addr,
    },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged(ip) => write!(f, "unchanged ({ip})"),
            Self::Updated {
                previous: Some(previous),
                current,
            } => write!(f, "updated {previous} -> {current}"),
            Self::Updated {
                previous: None,
                current,
            } => write!(f, "updated to {current}"),
        }
    }
}

/// Replaces every occurrence of the access key with a placeholder
///
/// # Examples
///
/// ```
/// use bunnyddns::orchestrator::redact_secret;
///
/// let redacted = redact_secret("request with key abc-123 failed", "abc-123");
/// assert_eq!(redacted, "request with key ***REDACTED*** failed");
/// ```
#[must_use]
pub fn redact_secret(message: &str, access_key: &str) -> String {
    if access_key.is_empty() {
        return message.to_string();
    }
    message.replace(access_key, REDACTED)
}

//==============================================================================
// Orchestrator
//==============================================================================

/// Single-run coordinator over the resolver, the DNS provider and the state store
pub struct Orchestrator<'a> {
    resolver: &'a dyn PublicIpResolver,
    provider: &'a dyn DnsProvider,
    store: &'a dyn StateStore,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        resolver: &'a dyn PublicIpResolver,
        provider: &'a dyn DnsProvider,
        store: &'a dyn StateStore,
    ) -> Self {
        Self {
            resolver,
            provider,
            store,
        }
    }

    /// Runs one update cycle
    ///
    /// 1. Discovers and persists the zone/record ids if either is missing
    /// 2. Resolves the public IPv4 address
    /// 3. Stops without any provider call or write when it is unchanged
    /// 4. Updates the A record, then persists the new address
    ///
    /// Failed state writes are logged and do not fail the run.
    ///
    /// # Errors
    ///
    /// Discovery, resolution and update failures are returned as-is; the caller's
    /// state is left untouched in that case.
    pub async fn run(&self, state: DdnsState) -> Result<(DdnsState, RunOutcome)> {
        let (state, ids) = self.bootstrap_if_needed(state).await?;

        let ip = self.resolver.resolve().await?;

        let previous = state.current_ip.parse::<Ipv4Addr>().ok();
        if previous == Some(ip) {
            info!("IP has not changed ({})", ip);
            return Ok((state, RunOutcome::Unchanged(ip)));
        }

        info!(
            "Updating bunny.net DNS | NEW IP {} | OLD IP {:?}",
            ip, state.current_ip
        );
        self.provider
            .upsert_a_record(&ids.zone_id, &ids.record_id, ip)
            .await?;
        info!("DNS record {} now points to {}", state.hostname, ip);

        let state = state.with_current_ip(ip);
        self.persist(&state).await;

        Ok((
            state,
            RunOutcome::Updated {
                previous,
                current: ip,
            },
        ))
    }

    /// Ensures both record ids are known, discovering them when needed
    async fn bootstrap_if_needed(&self, state: DdnsState) -> Result<(DdnsState, RecordIds)> {
        if let Some(ids) = state.dns_ids() {
            debug!("Using stored ids | ZONE {} | RECORD {}", ids.zone_id, ids.record_id);
            return Ok((state, ids));
        }

        info!("Looking up DNS zone and record for {}", state.hostname);
        let ids = discover(self.provider, &state.hostname).await?;
        let state = state.with_dns_ids(ids.clone());
        self.persist(&state).await;
        Ok((state, ids))
    }

    async fn persist(&self, state: &DdnsState) {
        match self.store.save(state).await {
            Ok(()) => debug!("State saved"),
            Err(e) => warn!("{}", e),
        }
    }
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_secret() {
        let message = "GET https://api.bunny.net with key secret123 failed (secret123)";
        let redacted = redact_secret(message, "secret123");
        assert!(!redacted.contains("secret123"));
        assert_eq!(redacted.matches(REDACTED).count(), 2);
    }

    #[test]
    fn test_redact_secret_empty_key() {
        assert_eq!(redact_secret("nothing to hide", ""), "nothing to hide");
    }

    #[test]
    fn test_run_outcome_display() {
        let ip = Ipv4Addr::new(203, 0, 113, 5);
        assert_eq!(RunOutcome::Unchanged(ip).to_string(), "unchanged (203.0.113.5)");
        assert_eq!(
            RunOutcome::Updated {
                previous: Some(Ipv4Addr::new(192, 0, 2, 1)),
                current: ip,
            }
            .to_string(),
            "updated 192.0.2.1 -> 203.0.113.5"
        );
        assert_eq!(
            RunOutcome::Updated {
                previous: None,
                current: ip,
            }
            .to_string(),
            "updated to 203.0.113.5"
        );
    }
}
