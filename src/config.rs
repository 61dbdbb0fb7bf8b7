//! Configuration module for bunnyddns
//!
//! This module handles loading and validating runtime settings from an optional
//! TOML file and environment variables. The persisted run state (current IP and
//! discovered ids) lives in [`crate::state`], not here.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;
use zeroize::ZeroizeOnDrop;

use crate::constants::{
    BUNNY_API_BASE, DEFAULT_STATE_FILE_NAME, DEFAULT_TIMEOUT_SECS, ENV_ACCESS_KEY, ENV_API_BASE,
    ENV_HOSTNAME, ENV_RECORD_ID, ENV_STATE_FILE, ENV_TIMEOUT, ENV_VERBOSE, ENV_ZONE_ID,
    MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
use crate::dns_provider::ResourceId;
use crate::error::{Error, Result};
use crate::validation::normalize_hostname;

//==============================================================================
// Settings
//==============================================================================

/// Runtime settings for a bunnyddns run
///
/// The access key is wrapped in `Zeroizing` so it is cleared from memory when
/// the settings are dropped.
///
/// # Configuration Loading Priority
///
/// 1. `--state` command line override (state file only)
/// 2. Environment variables
/// 3. Settings file (TOML, passed with `--config`)
/// 4. Defaults
#[derive(Debug, Clone, ZeroizeOnDrop)]
pub struct Settings {
    /// bunny.net account access key (`BUNNY_ACCESS_KEY`)
    #[zeroize(skip)]
    pub access_key: zeroize::Zeroizing<String>,
    /// Normalized hostname to keep updated (`NAS_URL`)
    ///
    /// Optional here because an existing state file may already carry it. It
    /// is validated only when the run actually uses it.
    #[zeroize(skip)]
    pub hostname: Option<String>,
    /// Pre-known zone id used to seed a fresh state file
    #[zeroize(skip)]
    pub zone_id: Option<ResourceId>,
    /// Pre-known record id used to seed a fresh state file
    #[zeroize(skip)]
    pub record_id: Option<ResourceId>,
    /// Path of the JSON state file
    ///
    /// Default: `DDNS_BUNNY_CONFIG.json` next to the executable
    #[zeroize(skip)]
    pub state_file: PathBuf,
    /// HTTP request timeout
    ///
    /// Default: 30 seconds
    #[zeroize(skip)]
    pub timeout: Duration,
    /// bunny.net API base URL
    #[zeroize(skip)]
    pub api_base: String,
    /// Enable verbose logging
    #[zeroize(skip)]
    pub verbose: bool,
}

impl Settings {
    /// Loads settings from file and environment variables
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to a TOML settings file
    /// * `state_override` - Optional state file path from the command line
    ///
    /// # Errors
    ///
    /// - [`Error::MissingRequiredSetting`] when no access key is configured
    /// - [`Error::InvalidSetting`] when the settings file cannot be parsed or a
    ///   value is malformed
    pub fn load(config_path: Option<PathBuf>, state_override: Option<PathBuf>) -> Result<Self> {
        let mut settings = Self::load_from_file(config_path)?;
        Self::override_with_env(&mut settings)?;
        if let Some(path) = state_override {
            settings.state_file = path;
        }
        settings.pair_seed_ids();
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file, falling back to defaults
    fn load_from_file(config_path: Option<PathBuf>) -> Result<Self> {
        let mut settings = Self::defaults();

        let Some(path) = config_path else {
            return Ok(settings);
        };
        if !path.exists() {
            warn!("Settings file {} not found, using defaults", path.display());
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::InvalidSetting {
            name: "settings file",
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let file: TomlSettings = toml::from_str(&content).map_err(|e| Error::InvalidSetting {
            name: "settings file",
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })?;

        if let Some(v) = file.access_key {
            settings.access_key = zeroize::Zeroizing::new(v);
        }
        if let Some(v) = file.hostname {
            settings.hostname = Some(normalize_hostname(&v));
        }
        if let Some(v) = file.zone_id {
            settings.zone_id = Some(v);
        }
        if let Some(v) = file.record_id {
            settings.record_id = Some(v);
        }
        if let Some(v) = file.state_file {
            settings.state_file = v;
        }
        if let Some(v) = file.timeout {
            settings.timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.api_base {
            settings.api_base = v;
        }
        if let Some(v) = file.verbose {
            settings.verbose = v;
        }

        Ok(settings)
    }

    fn defaults() -> Self {
        Self {
            access_key: zeroize::Zeroizing::new(String::new()),
            hostname: None,
            zone_id: None,
            record_id: None,
            state_file: default_state_file(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_base: BUNNY_API_BASE.to_string(),
            verbose: false,
        }
    }

    /// Overrides settings with environment variables
    ///
    /// Variables that are unset or empty leave the current value untouched.
    fn override_with_env(settings: &mut Self) -> Result<()> {
        if let Some(v) = non_empty_env(ENV_ACCESS_KEY) {
            settings.access_key = zeroize::Zeroizing::new(v);
        }
        if let Some(v) = non_empty_env(ENV_HOSTNAME) {
            settings.hostname = Some(normalize_hostname(&v));
        }
        if let Some(v) = non_empty_env(ENV_ZONE_ID) {
            settings.zone_id = Some(ResourceId::parse(&v));
        }
        if let Some(v) = non_empty_env(ENV_RECORD_ID) {
            settings.record_id = Some(ResourceId::parse(&v));
        }
        if let Some(v) = non_empty_env(ENV_STATE_FILE) {
            settings.state_file = PathBuf::from(v);
        }
        if let Some(v) = non_empty_env(ENV_TIMEOUT) {
            let secs = v.trim().parse::<u64>().map_err(|e| Error::InvalidSetting {
                name: ENV_TIMEOUT,
                reason: format!("expected whole seconds, got {v:?}: {e}"),
            })?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(v) = non_empty_env(ENV_API_BASE) {
            settings.api_base = v;
        }
        if let Some(v) = non_empty_env(ENV_VERBOSE) {
            settings.verbose = parse_bool_env(&v).ok_or_else(|| Error::InvalidSetting {
                name: ENV_VERBOSE,
                reason: "expected boolean (true/false/1/0/yes/no/on/off)".to_string(),
            })?;
        }
        Ok(())
    }

    /// Keeps the seed ids only when both are present
    fn pair_seed_ids(&mut self) {
        if self.zone_id.is_some() != self.record_id.is_some() {
            warn!(
                "Only one of {} and {} is set; ignoring both and discovering ids",
                ENV_ZONE_ID, ENV_RECORD_ID
            );
            self.zone_id = None;
            self.record_id = None;
        }
    }

    /// Validates the settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The access key is missing
    /// - The timeout is out of range
    /// - The API base URL is not http(s)
    fn validate(&self) -> Result<()> {
        if self.access_key.trim().is_empty() {
            return Err(Error::MissingRequiredSetting(ENV_ACCESS_KEY));
        }

        let timeout_secs = self.timeout.as_secs();
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(Error::InvalidSetting {
                name: "timeout",
                reason: format!(
                    "must be between {} and {} seconds, got {}",
                    MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, timeout_secs
                ),
            });
        }

        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            return Err(Error::InvalidSetting {
                name: ENV_API_BASE,
                reason: format!("must be an http(s) URL, got {}", self.api_base),
            });
        }

        Ok(())
    }
}

/// Default state file location: next to the executable
pub fn default_state_file() -> PathBuf {
    env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join(DEFAULT_STATE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE_NAME))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a boolean value from an environment variable
///
/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitively.
fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// TOML settings file structure
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSettings {
    access_key: Option<String>,
    hostname: Option<String>,
    zone_id: Option<ResourceId>,
    record_id: Option<ResourceId>,
    state_file: Option<PathBuf>,
    timeout: Option<u64>,
    api_base: Option<String>,
    verbose: Option<bool>,
}

//==============================================================================
// Tests
//==============================================================================
