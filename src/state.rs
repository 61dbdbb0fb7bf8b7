//! Persisted run state
//!
//! The state file is the only thing that survives between invocations: the last
//! published IPv4 address, the hostname and the discovered bunny.net ids.
//!
//! ```json
//! {
//!   "current_ip": "203.0.113.5",
//!   "hostname": "home.example.com",
//!   "dns_zone_id": 11,
//!   "dns_record_id": 21,
//!   "last_updated": "2026-01-09T12:00:00Z"
//! }
//! ```

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::constants::{ENV_HOSTNAME, LOCK_FILE_SUFFIX, STALE_LOCK_SECS};
use crate::discovery::RecordIds;
use crate::dns_provider::ResourceId;
use crate::error::{Error, Result};
use crate::validation::{normalize_hostname, validate_hostname};

//==============================================================================
// State
//==============================================================================

/// State carried from one run to the next
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdnsState {
    /// Last IPv4 address published to the record; empty before the first update
    #[serde(default)]
    pub current_ip: String,
    #[serde(default, alias = "nas_url")]
    pub hostname: String,
    #[serde(
        default,
        alias = "bunny_dns_zone_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub dns_zone_id: Option<ResourceId>,
    #[serde(
        default,
        alias = "bunny_dns_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub dns_record_id: Option<ResourceId>,
    /// When the record was last changed by this tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl DdnsState {
    /// Builds the starting state of a run
    ///
    /// A loaded state keeps its hostname and ids; settings only fill a missing
    /// hostname. Without a state file the hostname and the optional seed ids come
    /// from the settings.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingRequiredSetting`] when neither source has a hostname
    /// - [`Error::InvalidSetting`] when the hostname is not a valid DNS name
    pub fn initial(loaded: Option<DdnsState>, settings: &Settings) -> Result<Self> {
        let mut state = match loaded {
            Some(state) => state,
            None => DdnsState {
                dns_zone_id: settings.zone_id.clone(),
                dns_record_id: settings.record_id.clone(),
                ..DdnsState::default()
            },
        };

        let hostname = normalize_hostname(&state.hostname);
        state.hostname = if hostname.is_empty() {
            settings
                .hostname
                .clone()
                .ok_or(Error::MissingRequiredSetting(ENV_HOSTNAME))?
        } else {
            hostname
        };
        validate_hostname(&state.hostname).map_err(|e| Error::InvalidSetting {
            name: ENV_HOSTNAME,
            reason: e.to_string(),
        })?;

        if state.dns_zone_id.is_some() != state.dns_record_id.is_some() {
            warn!("State file holds only one of the zone/record ids; rediscovering both");
            state.dns_zone_id = None;
            state.dns_record_id = None;
        }

        Ok(state)
    }

    pub fn has_dns_ids(&self) -> bool {
        self.dns_zone_id.is_some() && self.dns_record_id.is_some()
    }

    /// Zone and record ids, when both are known
    pub fn dns_ids(&self) -> Option<RecordIds> {
        match (&self.dns_zone_id, &self.dns_record_id) {
            (Some(zone_id), Some(record_id)) => Some(RecordIds {
                zone_id: zone_id.clone(),
                record_id: record_id.clone(),
            }),
            _ => None,
        }
    }

    pub fn with_dns_ids(self, ids: RecordIds) -> Self {
        Self {
            dns_zone_id: Some(ids.zone_id),
            dns_record_id: Some(ids.record_id),
            ..self
        }
    }

    /// Records a published address and stamps the update time
    pub fn with_current_ip(self, ip: Ipv4Addr) -> Self {
        Self {
            current_ip: ip.to_string(),
            last_updated: Some(Utc::now()),
            ..self
        }
    }
}

//==============================================================================
// Stores
//==============================================================================

/// Loads and saves [`DdnsState`]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the stored state; `None` when nothing has been stored yet
    async fn load(&self) -> Result<Option<DdnsState>>;

    /// Replaces the stored state
    async fn save(&self, state: &DdnsState) -> Result<()>;
}

/// JSON file store with write-then-rename saves
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Option<DdnsState>> {
        let read_error = |reason: String| Error::ConfigRead {
            path: self.path.clone(),
            reason,
        };

        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("State file {} does not exist", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(read_error(e.to_string())),
        };

        let state = serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))?;
        debug!("Loaded state from {}", self.path.display());
        Ok(Some(state))
    }

    async fn save(&self, state: &DdnsState) -> Result<()> {
        let write_error = |reason: String| Error::ConfigWrite {
            path: self.path.clone(),
            reason,
        };

        let json = serde_json::to_string_pretty(state).map_err(|e| write_error(e.to_string()))?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .await
            .map_err(|e| write_error(format!("write {}: {}", temp_path.display(), e)))?;

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(write_error(format!("rename {}: {}", temp_path.display(), e)));
        }

        debug!("State written to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store that counts saves and can be told to fail them
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<DdnsState>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStateStore {
    pub fn new(initial: Option<DdnsState>) -> Self {
        Self {
            state: Mutex::new(initial),
            ..Self::default()
        }
    }

    /// Makes every subsequent save fail with [`Error::ConfigWrite`]
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<DdnsState> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<DdnsState>> {
        Ok(self.snapshot().await)
    }

    async fn save(&self, state: &DdnsState) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::ConfigWrite {
                path: PathBuf::from("<memory>"),
                reason: "writes disabled".to_string(),
            });
        }
        *self.state.lock().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//==============================================================================
// Lock
//==============================================================================

/// Exclusive `<state>.lock` file held for the length of a run
///
/// The lock file is removed when the guard is dropped. A lock file older than
/// [`STALE_LOCK_SECS`] is assumed to belong to a crashed run and is taken over.
///
/// Stale takeover is not atomic: two runs that both find the same stale lock
/// can each remove it, and the later removal may delete the lock the earlier
/// run just created. Overlapping runs are not expected, so this is tolerated.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    pub fn lock_path(state_file: &Path) -> PathBuf {
        let mut path = state_file.as_os_str().to_owned();
        path.push(LOCK_FILE_SUFFIX);
        PathBuf::from(path)
    }

    /// Acquires the lock for a state file
    ///
    /// Returns `Ok(None)` when the lock file cannot be created at all (for
    /// example a read-only state directory). The run then goes ahead unlocked,
    /// like any other state write failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateLocked`] when a fresh lock is held by another run.
    pub fn acquire(state_file: &Path) -> Result<Option<Self>> {
        let path = Self::lock_path(state_file);

        match create_lock_file(&path) {
            Ok(()) => return Ok(Some(Self { path })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Ok(unlocked(&path, &e)),
        }

        if !is_stale(&path) {
            return Err(Error::StateLocked { path });
        }

        warn!("Taking over stale lock {}", path.display());
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != ErrorKind::NotFound {
                return Ok(unlocked(&path, &e));
            }
        }

        match create_lock_file(&path) {
            Ok(()) => Ok(Some(Self { path })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::StateLocked { path }),
            Err(e) => Ok(unlocked(&path, &e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

fn unlocked(path: &Path, e: &std::io::Error) -> Option<StateLock> {
    warn!("Cannot create lock {}: {}; running unlocked", path.display(), e);
    None
}

fn create_lock_file(path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", std::process::id())
}

fn is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > Duration::from_secs(STALE_LOCK_SECS))
}

//==============================================================================
// Tests
//==============================================================================
