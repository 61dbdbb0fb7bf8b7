//! Validation utilities for bunnyddns
//!
//! This module provides validation functions for IPv4 candidates returned by
//! the IP sources and for the hostname kept up to date.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;

use crate::constants::{MAX_HOSTNAME_LENGTH, MAX_LABEL_LENGTH};

/// Strict dotted-quad pattern: four octets 0-255, no leading zeros, exact match.
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((25[0-5]|(2[0-4]|1[0-9]|[1-9])?[0-9])\.?\b){4}$").expect("IPv4 pattern compiles")
});

/// Checks whether a candidate string is a strict dotted-quad IPv4 address
///
/// The whole candidate must match: surrounding text, leading zeros, octets above
/// 255 and anything other than four groups are rejected.
///
/// # Examples
///
/// ```
/// use bunnyddns::validation::is_valid_ipv4;
///
/// assert!(is_valid_ipv4("203.0.113.5"));
/// assert!(is_valid_ipv4("0.0.0.0"));
/// assert!(is_valid_ipv4("255.255.255.255"));
///
/// assert!(!is_valid_ipv4(""));
/// assert!(!is_valid_ipv4("256.1.1.1"));
/// assert!(!is_valid_ipv4("1.2.3"));
/// assert!(!is_valid_ipv4("1.2.3.4.5"));
/// assert!(!is_valid_ipv4("a.b.c.d"));
/// assert!(!is_valid_ipv4("ip=1.2.3.4"));
/// ```
pub fn is_valid_ipv4(candidate: &str) -> bool {
    IPV4_PATTERN.is_match(candidate)
}

/// Validates a candidate and converts it into an [`Ipv4Addr`]
///
/// Returns `None` when the candidate fails [`is_valid_ipv4`].
pub fn parse_ipv4(candidate: &str) -> Option<Ipv4Addr> {
    if !is_valid_ipv4(candidate) {
        return None;
    }
    candidate.parse().ok()
}

/// Normalizes a user supplied hostname
///
/// Strips an `http://` or `https://` scheme, drops any path, query or port and
/// lower-cases the result. Surrounding whitespace and a trailing dot are removed.
///
/// # Examples
///
/// ```
/// use bunnyddns::validation::normalize_hostname;
///
/// assert_eq!(normalize_hostname("https://NAS.Example.com"), "nas.example.com");
/// assert_eq!(normalize_hostname("http://nas.example.com:5001/login"), "nas.example.com");
/// assert_eq!(normalize_hostname("home.example.com"), "home.example.com");
/// ```
pub fn normalize_hostname(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = authority.split(':').next().unwrap_or_default();

    host.trim_end_matches('.').to_string()
}

/// Validates that a string is a usable DNS hostname
///
/// This function validates hostnames according to RFC 1035 and common DNS conventions.
///
/// # Validation Rules
///
/// 1. **Length constraints**:
///    - Maximum total length: 253 characters (excluding trailing dot)
///    - Maximum label length: 63 characters
///
/// 2. **Syntax rules**:
///    - Labels must be separated by dots (`.`)
///    - Labels cannot start or end with hyphens (`-`)
///    - Labels cannot contain spaces
///    - Empty labels are not allowed (e.g., `example..com`)
///
/// 3. **Allowed characters**: letters, digits, hyphens and underscores
///
/// # Examples
///
/// ```
/// use bunnyddns::validation::validate_hostname;
///
/// assert!(validate_hostname("example.com").is_ok());
/// assert!(validate_hostname("home.example.com").is_ok());
/// assert!(validate_hostname("example.com.").is_ok());
///
/// assert!(validate_hostname("").is_err());
/// assert!(validate_hostname("example..com").is_err());
/// assert!(validate_hostname("-example.com").is_err());
/// assert!(validate_hostname("ex@mple.com").is_err());
/// ```
pub fn validate_hostname(hostname: &str) -> Result<()> {
    let trimmed = hostname.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Hostname cannot be empty"));
    }
    if trimmed.contains(' ') {
        return Err(anyhow!("Hostname cannot contain spaces"));
    }

    let name = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if name.is_empty() {
        return Err(anyhow!("Hostname cannot be empty"));
    }
    if name.len() > MAX_HOSTNAME_LENGTH {
        return Err(anyhow!(
            "Hostname too long (max {} characters, got {})",
            MAX_HOSTNAME_LENGTH,
            name.len()
        ));
    }
    if name.starts_with('.') {
        return Err(anyhow!("Hostname cannot start with a dot"));
    }
    if name.contains("..") {
        return Err(anyhow!("Hostname cannot contain consecutive dots"));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(anyhow!("Hostname contains empty label"));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(anyhow!(
                "Hostname label too long (max {} characters, got {})",
                MAX_LABEL_LENGTH,
                label.len()
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(anyhow!("Hostname label cannot start or end with hyphen"));
        }
        for ch in label.chars() {
            if !ch.is_ascii_alphanumeric() && ch != '-' && ch != '_' {
                return Err(anyhow!(
                    "Hostname contains invalid character: '{}' (allowed: letters, digits, '-', '_')",
                    ch
                ));
            }
        }
    }

    Ok(())
}
