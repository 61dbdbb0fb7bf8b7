//! HTTP client construction
//!
//! The IP sources and the bunny.net API share one client configuration: rustls,
//! the bunnyddns user agent and a bounded connect and total timeout. A request
//! that runs past the timeout fails like any other transport error.

use std::time::Duration;

use crate::constants::USER_AGENT;
use crate::error::{Error, Result};

/// Builds an HTTP client with the given connect and total timeout
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::HttpClient(e.to_string()))
}
