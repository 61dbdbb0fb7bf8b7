//! Error types for bunnyddns
//!
//! Every failure a run can hit is one variant of [`Error`]. Per-source resolver
//! errors (`SourceUnavailable`, `InvalidIpFormat`) are logged and drive the
//! fallback chain; everything else is fatal for the run.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for bunnyddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bunnyddns
#[derive(Error, Debug)]
pub enum Error {
    /// State file exists but could not be read or parsed
    #[error("cannot read state file {}: {reason}", .path.display())]
    ConfigRead { path: PathBuf, reason: String },

    /// State file could not be written
    #[error("cannot update state file {}: {reason}", .path.display())]
    ConfigWrite { path: PathBuf, reason: String },

    /// A required setting is absent
    #[error("the environment variable {0} is not defined")]
    MissingRequiredSetting(&'static str),

    /// A setting is present but malformed
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// One IP source could not be queried
    #[error("GET {url} (source #{index}) failed{}: {reason}", fmt_status(.status))]
    SourceUnavailable {
        index: usize,
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// One IP source answered with something that is not an IPv4 address
    #[error("GET {url} (source #{index}) returned an invalid IPv4 address: {candidate:?}")]
    InvalidIpFormat {
        index: usize,
        url: String,
        candidate: String,
    },

    /// Every IP source failed
    #[error("all {attempted} IP sources are unavailable, retry later")]
    AllSourcesExhausted { attempted: usize },

    /// Listing DNS zones failed
    #[error("listing DNS zones failed{}: {reason}", fmt_status(.status))]
    ZoneListFailed { status: Option<u16>, reason: String },

    /// No zone matches the hostname
    #[error("DNS zone is not found for {hostname}")]
    ZoneNotFound { hostname: String },

    /// No A record in the matched zone matches the hostname
    #[error("DNS record is not found for {hostname} in zone {zone_id}")]
    RecordNotFound { hostname: String, zone_id: String },

    /// The record upsert was rejected or did not complete
    #[error("DNS record update failed{}: {reason}", fmt_status(.status))]
    UpdateFailed { status: Option<u16>, reason: String },

    /// The HTTP client could not be constructed
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),

    /// Another run holds the state lock
    #[error("state file {} is locked by another run", .path.display())]
    StateLocked { path: PathBuf },
}

impl Error {
    /// Whether this error only disqualifies a single IP source
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::InvalidIpFormat { .. }
        )
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}
