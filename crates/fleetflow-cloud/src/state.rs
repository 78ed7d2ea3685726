//! State management for provisioned resources
//!
//! Manages the `.fleetflow/provision.json` file which records, for every
//! declared resource address, the remote identifier and the attributes
//! read back from the provider.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".fleetflow";
const STATE_FILE: &str = "provision.json";
const STATE_BACKUP: &str = "provision.json.backup";
const LOCK_FILE: &str = "provision.lock";

/// Global state containing all provisioned resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by address (`type.name`)
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, address: String, state: ResourceState) {
        self.resources.insert(address, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, address: &str) -> Option<ResourceState> {
        let result = self.resources.remove(address);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    /// Get a resource by address
    pub fn get_resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }
}

/// State of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-specific resource ID
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Current status
    pub status: ResourceStatus,

    /// Attributes as last read from the provider
    pub attributes: Map<String, Value>,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Unknown,
            attributes: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self.updated_at = Utc::now();
        self
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource matches its remote object
    Ready,
    /// Resource was created but a follow-up step failed; it is replaced on
    /// the next apply
    Tainted,
    /// Status is unknown
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Tainted => write!(f, "tainted"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
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

    /// Get the state directory path
    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    /// Get the state file path
    pub fn state_path(&self) -> PathBuf {
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

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Writes the state through a staging file so a crash never leaves a
    /// truncated state behind. The replaced file is kept as the backup.
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(state)?).await?;

        if path.exists() {
            fs::copy(&path, self.backup_path()).await?;
        }
        fs::rename(&staging, &path).await?;

        tracing::debug!(
            resources = state.resources.len(),
            path = %path.display(),
            "state saved"
        );
        Ok(())
    }

    /// Takes the exclusive lock on the state. A lock left behind by a run
    /// that started more than an hour ago is taken over.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;
        let path = self.lock_path();

        if let Some(existing) = LockHolder::read(&path).await? {
            if !existing.is_stale(Utc::now()) {
                return Err(CloudError::LockError(format!(
                    "state is held by {}; remove {} if that run is gone",
                    existing,
                    path.display()
                )));
            }
            tracing::warn!(holder = %existing, "taking over stale state lock");
            fs::remove_file(&path).await?;
        }

        let holder = LockHolder::current();
        holder.write_new(&path).await?;

        tracing::debug!(holder = %holder, "state lock acquired");
        Ok(StateLock { path, held: true })
    }
}

/// Locks older than this are considered abandoned
const LOCK_STALE_AFTER_SECS: i64 = 60 * 60;

/// Contents of `provision.lock`
#[derive(Debug, Serialize, Deserialize)]
struct LockHolder {
    host: String,
    pid: u32,
    acquired_at: DateTime<Utc>,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            host: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }

    async fn read(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.acquired_at).num_seconds() >= LOCK_STALE_AFTER_SECS
    }

    /// Creates the lock file; fails if another run created it first
    async fn write_new(&self, path: &Path) -> Result<()> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CloudError::LockError(format!(
                    "{} was created by another run",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&serde_json::to_vec_pretty(self)?).await?;
        file.flush().await?;
        Ok(())
    }
}

impl std::fmt::Display for LockHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (pid {}) since {}",
            self.host,
            self.pid,
            self.acquired_at.to_rfc3339()
        )
    }
}

/// Held state lock. The lock file is removed on `release`, or on drop when
/// a command bails out early.
pub struct StateLock {
    path: PathBuf,
    held: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.held = false;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("state lock released");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if self.held {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut attrs = Map::new();
        attrs.insert("name".into(), serde_json::json!("web"));

        let mut state = GlobalState::new();
        state.set_resource(
            "exoscale_network.web".to_string(),
            ResourceState::new("6c0e2f5a", "exoscale_network")
                .with_status(ResourceStatus::Ready)
                .with_attributes(attrs),
        );

        manager.save(&state).await.unwrap();
        manager.save(&state).await.unwrap();
        assert!(manager.backup_path().exists());

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        let network = loaded.get_resource("exoscale_network.web").unwrap();
        assert_eq!(network.get_attribute::<String>("name").as_deref(), Some("web"));
        assert_eq!(network.status, ResourceStatus::Ready);
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_newer_state_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.version = STATE_VERSION + 1;
        manager.save(&state).await.unwrap();

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, CloudError::StateError(_)));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(
            manager.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = manager.acquire_lock().await.unwrap();
        drop(again);
        assert!(!manager.lock_path().exists());
    }

    #[tokio::test]
    async fn test_lock_error_names_holder() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let _lock = manager.acquire_lock().await.unwrap();
        let err = manager.acquire_lock().await.err().unwrap().to_string();
        assert!(err.contains(&format!("pid {}", std::process::id())));
        assert!(err.contains("provision.lock"));
    }

    #[tokio::test]
    async fn test_stale_lock_is_taken_over() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        manager.ensure_state_dir().await.unwrap();

        let abandoned = LockHolder {
            host: "ci-runner".into(),
            pid: 1,
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(manager.lock_path(), serde_json::to_vec(&abandoned).unwrap()).unwrap();

        let lock = manager.acquire_lock().await.unwrap();
        let content = std::fs::read_to_string(manager.lock_path()).unwrap();
        let holder: LockHolder = serde_json::from_str(&content).unwrap();
        assert_eq!(holder.pid, std::process::id());
        lock.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_leaves_no_staging_file() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        manager.save(&GlobalState::new()).await.unwrap();
        assert!(manager.state_path().exists());
        assert!(!manager.state_path().with_extension("json.tmp").exists());
    }
}
