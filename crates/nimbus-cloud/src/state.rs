//! Load balancer state
//!
//! Load balancers are identified by address only, so whoever creates them has
//! to remember the addresses until they are destroyed. The CLI keeps them in
//! `.nimbus/state.json`.

use crate::error::{CloudError, Result};
use crate::load_balancer::{LoadBalancerSpec, LocationOutcome};
use crate::node::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".nimbus";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// A lock left behind this long by a crashed run no longer blocks
pub const STALE_LOCK_MINUTES: i64 = 30;

/// All load balancers created through nimbus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Records indexed by `<name>:<location id>`
    pub load_balancers: HashMap<String, LoadBalancerRecord>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            load_balancers: HashMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record
    pub fn insert(&mut self, record: LoadBalancerRecord) {
        self.load_balancers.insert(record.key(), record);
        self.updated_at = Utc::now();
    }

    /// Find the record whose balancer answers on `address`
    pub fn find_by_address(&self, address: IpAddr) -> Option<&LoadBalancerRecord> {
        self.load_balancers
            .values()
            .find(|record| record.addresses.contains(&address))
    }

    /// Remove the record whose balancer answers on `address`
    pub fn remove_by_address(&mut self, address: IpAddr) -> Option<LoadBalancerRecord> {
        let key = self.find_by_address(address)?.key();
        let removed = self.load_balancers.remove(&key);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Records sorted by name, then location
    pub fn records(&self) -> Vec<&LoadBalancerRecord> {
        let mut records: Vec<_> = self.load_balancers.values().collect();
        records.sort_by(|a, b| (&a.name, &a.location.id).cmp(&(&b.name, &b.location.id)));
        records
    }
}

/// One load balancer at one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancerRecord {
    pub name: String,

    /// Provider that owns the balancer (e.g. "sakura-cloud")
    pub provider: String,

    pub location: Location,

    pub spec: LoadBalancerSpec,

    pub dns_name: String,

    /// Empty when the DNS name never resolved
    pub addresses: Vec<IpAddr>,

    pub created_at: DateTime<Utc>,
}

impl LoadBalancerRecord {
    pub fn new(
        provider: impl Into<String>,
        location: Location,
        spec: LoadBalancerSpec,
        outcome: &LocationOutcome,
    ) -> Self {
        Self {
            name: spec.name.clone(),
            provider: provider.into(),
            location,
            spec,
            dns_name: outcome.dns_name().to_string(),
            addresses: outcome.addresses().to_vec(),
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.location.id)
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!(
            "Loaded state with {} load balancers",
            state.load_balancers.len()
        );
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved state with {} load balancers",
            state.load_balancers.len()
        );
        Ok(())
    }

    /// Take the state lock for `operation` (e.g. `lb create web`)
    ///
    /// A lock held by another run is an error unless it is older than
    /// [`STALE_LOCK_MINUTES`].
    pub async fn acquire_lock(&self, operation: &str) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let held: LockInfo = serde_json::from_str(&content)?;

            let age = Utc::now().signed_duration_since(held.acquired_at);
            if age.num_minutes() < STALE_LOCK_MINUTES {
                return Err(CloudError::LockError(format!(
                    "`{}` is running (pid {} on {}, since {})",
                    held.operation, held.pid, held.holder, held.acquired_at
                )));
            }

            tracing::warn!(
                "Taking over stale lock for `{}` (pid {} on {})",
                held.operation,
                held.pid,
                held.holder
            );
        }

        let info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            operation: operation.to_string(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };

        fs::write(&lock_path, serde_json::to_string_pretty(&info)?).await?;

        tracing::debug!("Acquired state lock for `{}`", operation);
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// Contents of `.nimbus/lock.json`
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    operation: String,
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
