//! bunnyddns - single-shot IPv4 dynamic DNS updater for bunny.net
//!
//! Architecture:
//! - Ordered public IP sources with fallback ([`resolver`], [`ip_source`])
//! - Zone/record discovery by hostname, cached in a JSON state file ([`discovery`], [`state`])
//! - A record update only when the address changed ([`orchestrator`])
//! - Uses reqwest for HTTP (rustls)

pub mod bunny;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod dns_provider;
pub mod error;
pub mod http;
pub mod ip_source;
pub mod orchestrator;
pub mod resolver;
pub mod state;
pub mod validation;

pub use error::{Error, Result};
