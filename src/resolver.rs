//! Public IPv4 resolution over the IP source table
//!
//! Sources are tried strictly in order. A source that fails at the HTTP level or
//! answers with something that is not a dotted-quad is logged and skipped; the
//! first valid answer wins and no later source is contacted.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http;
use crate::ip_source::{default_sources, IpSource};
use crate::validation::parse_ipv4;

//==============================================================================
// Trait
//==============================================================================

/// Determines the caller's current public IPv4 address
#[async_trait]
pub trait PublicIpResolver: Send + Sync {
    /// Resolves the public address
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllSourcesExhausted`] when no source produced a valid address.
    async fn resolve(&self) -> Result<Ipv4Addr>;
}

//==============================================================================
// HTTP resolver
//==============================================================================

/// Resolver walking an ordered table of HTTP IP sources
pub struct HttpIpResolver {
    client: reqwest::Client,
    sources: Vec<IpSource>,
}

impl HttpIpResolver {
    /// Creates a resolver over the default source table
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_sources(http::client(timeout)?, default_sources()))
    }

    /// Creates a resolver over a custom source table
    pub fn with_sources(client: reqwest::Client, sources: Vec<IpSource>) -> Self {
        Self { client, sources }
    }

    /// Queries a single source and validates its answer
    async fn query(&self, index: usize, source: &IpSource) -> Result<Ipv4Addr> {
        let url = source.endpoint.as_str();
        let unavailable = |status: Option<u16>, reason: String| Error::SourceUnavailable {
            index,
            url: url.to_string(),
            status,
            reason,
        };

        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(unavailable(Some(status.as_u16()), reason.to_string()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| unavailable(Some(status.as_u16()), e.to_string()))?;

        let candidate = source.extractor.extract(&body).unwrap_or_default();
        parse_ipv4(candidate).ok_or_else(|| Error::InvalidIpFormat {
            index,
            url: url.to_string(),
            candidate: candidate.to_string(),
        })
    }
}

#[async_trait]
impl PublicIpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        for (index, source) in self.sources.iter().enumerate() {
            match self.query(index, source).await {
                Ok(ip) => {
                    info!("Public IPv4 {} from {}", ip, source.endpoint);
                    return Ok(ip);
                }
                Err(e) if e.is_source_error() => {
                    warn!("{}", e);
                    if index + 1 < self.sources.len() {
                        info!("Activating fallback");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::AllSourcesExhausted {
            attempted: self.sources.len(),
        })
    }
}

//==============================================================================
// Tests
//==============================================================================
