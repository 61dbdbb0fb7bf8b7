//! bunny.net DNS API client
//!
//! Uses reqwest with rustls for HTTP requests.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{ACCESS_KEY_HEADER, DNS_RECORD_TYPE_A, MAX_ZONE_PAGES, ZONE_PAGE_SIZE};
use crate::dns_provider::{DnsProvider, DnsZone, ResourceId};
use crate::error::{Error, Result};
use crate::http;

/// Longest response body excerpt carried in an error
const BODY_EXCERPT_LEN: usize = 200;

//==============================================================================
// Types
//==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneListPage {
    #[serde(default)]
    items: Vec<DnsZone>,
    #[serde(default)]
    has_more_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpsertPayload<'a> {
    #[serde(rename = "Type")]
    record_type: u8,
    value: String,
    id: &'a ResourceId,
}

//==============================================================================
// Client
//==============================================================================

pub struct BunnyClient {
    access_key: Zeroizing<String>,
    api_base: String,
    client: reqwest::Client,
}

impl BunnyClient {
    pub fn new(access_key: &str, timeout: Duration, api_base: &str) -> Result<Self> {
        Ok(Self {
            access_key: Zeroizing::new(access_key.to_string()),
            api_base: api_base.trim_end_matches('/').to_string(),
            client: http::client(timeout)?,
        })
    }

    /// Fetch one page of the zone list
    async fn zone_page(&self, page: u32) -> Result<ZoneListPage> {
        let url = format!(
            "{}/dnszone?page={}&perPage={}",
            self.api_base, page, ZONE_PAGE_SIZE
        );

        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .header(ACCESS_KEY_HEADER, self.access_key.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::ZoneListFailed {
                status: None,
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ZoneListFailed {
                status: Some(status.as_u16()),
                reason: describe_failure(status, &body),
            });
        }

        resp.json().await.map_err(|e| Error::ZoneListFailed {
            status: Some(status.as_u16()),
            reason: format!("Failed to parse response: {e}"),
        })
    }
}

#[async_trait]
impl DnsProvider for BunnyClient {
    async fn list_zones(&self) -> Result<Vec<DnsZone>> {
        let mut zones = Vec::new();

        for page in 1..=MAX_ZONE_PAGES {
            let body = self.zone_page(page).await?;
            zones.extend(body.items);
            if !body.has_more_items {
                return Ok(zones);
            }
        }

        warn!(
            "Zone list truncated after {} pages ({} zones)",
            MAX_ZONE_PAGES,
            zones.len()
        );
        Ok(zones)
    }

    async fn upsert_a_record(
        &self,
        zone_id: &ResourceId,
        record_id: &ResourceId,
        ip: Ipv4Addr,
    ) -> Result<()> {
        let url = format!(
            "{}/dnszone/{}/records/{}",
            self.api_base,
            encode(&zone_id.to_string()),
            encode(&record_id.to_string())
        );
        let payload = UpsertPayload {
            record_type: DNS_RECORD_TYPE_A,
            value: ip.to_string(),
            id: record_id,
        };

        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .header(ACCESS_KEY_HEADER, self.access_key.as_str())
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::UpdateFailed {
                status: None,
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpdateFailed {
                status: Some(status.as_u16()),
                reason: describe_failure(status, &body),
            });
        }

        Ok(())
    }
}

/// Human readable reason for a non-success API response
fn describe_failure(status: StatusCode, body: &str) -> String {
    if status == StatusCode::UNAUTHORIZED {
        return "Access key rejected by bunny.net".to_string();
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return "Rate limited by bunny.net".to_string();
    }

    let reason = status.canonical_reason().unwrap_or("Unexpected status");
    let body = body.trim();
    if body.is_empty() {
        return reason.to_string();
    }
    let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{reason} | {excerpt}")
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "test-access-key";

    fn client(server: &MockServer) -> BunnyClient {
        BunnyClient::new(KEY, Duration::from_secs(5), &server.uri()).expect("client")
    }

    #[tokio::test]
    async fn test_list_zones_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dnszone"))
            .and(query_param("page", "1"))
            .and(header(ACCESS_KEY_HEADER, KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [{
                    "Id": 11,
                    "Domain": "example.com",
                    "Records": [{ "Id": 21, "Type": 0, "Name": "home", "Value": "192.0.2.1" }]
                }],
                "CurrentPage": 1,
                "TotalItems": 1,
                "HasMoreItems": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zones = client(&server).list_zones().await.unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, ResourceId::Numeric(11));
        assert_eq!(zones[0].records[0].id, ResourceId::Numeric(21));
    }

    #[tokio::test]
    async fn test_list_zones_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dnszone"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [{ "Id": 1, "Domain": "one.example", "Records": [] }],
                "HasMoreItems": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dnszone"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [{ "Id": 2, "Domain": "two.example", "Records": null }],
                "HasMoreItems": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zones = client(&server).list_zones().await.unwrap();
        let domains: Vec<_> = zones.iter().map(|z| z.domain.as_str()).collect();
        assert_eq!(domains, ["one.example", "two.example"]);
        assert!(zones[1].records.is_empty());
    }

    #[tokio::test]
    async fn test_list_zones_rejected_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dnszone"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).list_zones().await.unwrap_err();
        match err {
            Error::ZoneListFailed { status, reason } => {
                assert_eq!(status, Some(401));
                assert!(reason.contains("Access key rejected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_zones_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dnszone"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).list_zones().await.unwrap_err();
        assert!(matches!(err, Error::ZoneListFailed { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn test_upsert_sends_a_record_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dnszone/11/records/21"))
            .and(header(ACCESS_KEY_HEADER, KEY))
            .and(body_json(json!({ "Type": 0, "Value": "203.0.113.5", "Id": 21 })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .upsert_a_record(
                &ResourceId::Numeric(11),
                &ResourceId::Numeric(21),
                Ipv4Addr::new(203, 0, 113, 5),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upsert_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dnszone/Z1/records/R1"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"Message":"Invalid record"}"#),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .upsert_a_record(&"Z1".into(), &"R1".into(), Ipv4Addr::new(192, 0, 2, 1))
            .await
            .unwrap_err();
        match err {
            Error::UpdateFailed { status, reason } => {
                assert_eq!(status, Some(400));
                assert!(reason.contains("Bad Request"));
                assert!(reason.contains("Invalid record"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_describe_failure() {
        assert_eq!(
            describe_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            "Rate limited by bunny.net"
        );
        assert_eq!(
            describe_failure(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "Internal Server Error"
        );
        let long = "x".repeat(500);
        let described = describe_failure(StatusCode::BAD_REQUEST, &long);
        assert_eq!(described.len(), "Bad Request | ".len() + BODY_EXCERPT_LEN);
    }
}
