//! Public IP discovery sources
//!
//! Each source is an HTTP endpoint plus the rule used to pull a candidate
//! address out of its response body. The default table is ordered: index 0 is
//! tried first and later entries are only consulted as fallbacks.

use std::fmt;

//==============================================================================
// Types
//==============================================================================

/// How a candidate address is extracted from a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// The first line of the body holds the address
    FirstLine,
    /// The body is a `key=value` trace blob carrying an `ip=` line
    Trace,
}

impl Extractor {
    /// Extracts the candidate address from a response body
    ///
    /// Returns `None` when the body has no candidate at all (a trace blob
    /// without an `ip=` line). The candidate is not validated here.
    pub fn extract<'a>(&self, body: &'a str) -> Option<&'a str> {
        match self {
            Self::FirstLine => body.split('\n').next().map(str::trim),
            Self::Trace => body
                .lines()
                .find_map(|line| line.trim().strip_prefix("ip="))
                .map(str::trim),
        }
    }
}

/// An IP discovery endpoint and its extraction rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpSource {
    pub endpoint: String,
    pub extractor: Extractor,
}

impl IpSource {
    pub fn new(endpoint: impl Into<String>, extractor: Extractor) -> Self {
        Self {
            endpoint: endpoint.into(),
            extractor,
        }
    }

    /// A source answering with the bare address on its first line
    pub fn plain(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Extractor::FirstLine)
    }

    /// A source answering with a `/cdn-cgi/trace` style blob
    pub fn trace(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Extractor::Trace)
    }
}

impl fmt::Display for IpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.endpoint, self.extractor)
    }
}

//==============================================================================
// Default table
//==============================================================================

/// Endpoints and extraction rules of the default table, in priority order
const DEFAULT_SOURCES: [(&str, Extractor); 5] = [
    ("https://api.ipify.org", Extractor::FirstLine),
    ("https://icanhazip.com/", Extractor::FirstLine),
    ("https://1.1.1.1/cdn-cgi/trace", Extractor::Trace),
    ("https://cloudflare.com/cdn-cgi/trace", Extractor::Trace),
    ("https://api.my-ip.io/v2/ip.txt", Extractor::FirstLine),
];

/// Builds the default ordered source table
pub fn default_sources() -> Vec<IpSource> {
    DEFAULT_SOURCES
        .iter()
        .map(|(endpoint, extractor)| IpSource::new(*endpoint, *extractor))
        .collect()
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_extraction() {
        assert_eq!(Extractor::FirstLine.extract("203.0.113.5\n"), Some("203.0.113.5"));
        assert_eq!(Extractor::FirstLine.extract("203.0.113.5"), Some("203.0.113.5"));
        assert_eq!(Extractor::FirstLine.extract("203.0.113.5\r\n"), Some("203.0.113.5"));
        assert_eq!(
            Extractor::FirstLine.extract("203.0.113.5\nsecond line\n"),
            Some("203.0.113.5")
        );
        assert_eq!(Extractor::FirstLine.extract(""), Some(""));
    }

    #[test]
    fn test_trace_extraction() {
        assert_eq!(
            Extractor::Trace.extract("ip=203.0.113.5\nloc=US\n"),
            Some("203.0.113.5")
        );

        let blob = "fl=29f1\nh=1.1.1.1\nip=198.51.100.7\nts=1700000000.1\nvisit_scheme=https\nloc=DE\n";
        assert_eq!(Extractor::Trace.extract(blob), Some("198.51.100.7"));
    }

    #[test]
    fn test_trace_without_ip_line() {
        assert_eq!(Extractor::Trace.extract("fl=29f1\nloc=US\n"), None);
        assert_eq!(Extractor::Trace.extract(""), None);
    }

    #[test]
    fn test_default_sources_order() {
        let sources = default_sources();
        assert_eq!(sources.len(), 5);
        assert_eq!(sources[0], IpSource::plain("https://api.ipify.org"));
        assert_eq!(sources[1], IpSource::plain("https://icanhazip.com/"));
        assert_eq!(sources[2], IpSource::trace("https://1.1.1.1/cdn-cgi/trace"));
        assert_eq!(sources[3], IpSource::trace("https://cloudflare.com/cdn-cgi/trace"));
        assert_eq!(sources[4], IpSource::plain("https://api.my-ip.io/v2/ip.txt"));
    }
}
