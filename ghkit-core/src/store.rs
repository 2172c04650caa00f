//! Persisted workspace snapshots.
//!
//! # Storage layout
//!
//! ```text
//! ~/.ghkit/
//!   workspaces/
//!     <login>/
//!       snapshot.yaml      (mode 0600)
//!       permissions.yaml   (mode 0600, written once at init)
//! ```
//!
//! # API pattern
//!
//! Path-level functions take the home directory explicitly (`fn_at(home, …)`);
//! the binary resolves it once and tests pass a `TempDir`.
//!
//! The orchestrator never touches paths directly; it is handed a
//! [`SnapshotStore`]. There is no locking: two concurrent writers race and
//! the last rename wins.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, StoreError};
use crate::types::{PermissionsRecord, Snapshot};

const SNAPSHOT_FILE: &str = "snapshot.yaml";
const PERMISSIONS_FILE: &str = "permissions.yaml";

// ---------------------------------------------------------------------------
// 1. Store abstraction
// ---------------------------------------------------------------------------

/// Load/save access to one workspace's persisted snapshot.
pub trait SnapshotStore {
    /// `Ok(None)` when no snapshot has been written yet.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the persisted snapshot. Never merges.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StoreError>;

    fn save_permissions(&mut self, record: &PermissionsRecord) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.ghkit/workspaces/<login>/`. Pure, no I/O.
pub fn workspace_dir_at(home: &Path, login: &str) -> PathBuf {
    home.join(".ghkit").join("workspaces").join(login)
}

/// `<home>/.ghkit/workspaces/<login>/snapshot.yaml`
pub fn snapshot_path_at(home: &Path, login: &str) -> PathBuf {
    workspace_dir_at(home, login).join(SNAPSHOT_FILE)
}

/// `<home>/.ghkit/workspaces/<login>/permissions.yaml`
pub fn permissions_path_at(home: &Path, login: &str) -> PathBuf {
    workspace_dir_at(home, login).join(PERMISSIONS_FILE)
}

// ---------------------------------------------------------------------------
// 3. Load / save
// ---------------------------------------------------------------------------

/// Load the snapshot for `login`, or `None` if it has never been written.
///
/// Returns `StoreError::Parse` (with path + line context) on malformed YAML
/// and `StoreError::Integrity` if the document carries duplicate keys.
pub fn load_snapshot_at(home: &Path, login: &str) -> Result<Option<Snapshot>, StoreError> {
    let path = snapshot_path_at(home, login);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let snapshot: Snapshot =
        serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })?;
    snapshot.validate()?;
    Ok(Some(snapshot))
}

/// Atomically write the snapshot for `snapshot.workspace.login`.
pub fn save_snapshot_at(home: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    snapshot.validate()?;
    let path = snapshot_path_at(home, &snapshot.workspace.login);
    write_yaml_atomic(&path, snapshot)?;
    tracing::info!("wrote snapshot: {}", path.display());
    Ok(())
}

/// Atomically write the permissions side record.
pub fn save_permissions_at(home: &Path, record: &PermissionsRecord) -> Result<(), StoreError> {
    let path = permissions_path_at(home, &record.login);
    write_yaml_atomic(&path, record)?;
    tracing::debug!("wrote permissions record: {}", path.display());
    Ok(())
}

/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem).
fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid snapshot path")));
    };
    ensure_dir(dir)?;

    let yaml = serde_yaml::to_string(value)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        set_dir_permissions(dir)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Store implementations
// ---------------------------------------------------------------------------

/// File-backed store rooted at a home directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    home: PathBuf,
    login: String,
}

impl FileSnapshotStore {
    pub fn open_at(home: &Path, login: impl Into<String>) -> Self {
        Self {
            home: home.to_path_buf(),
            login: login.into(),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path_at(&self.home, &self.login)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        load_snapshot_at(&self.home, &self.login)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if snapshot.workspace.login != self.login {
            return Err(StoreError::Integrity(format!(
                "snapshot for '{}' cannot be written to the '{}' store",
                snapshot.workspace.login, self.login
            )));
        }
        save_snapshot_at(&self.home, snapshot)
    }

    fn save_permissions(&mut self, record: &PermissionsRecord) -> Result<(), StoreError> {
        save_permissions_at(&self.home, record)
    }
}

/// In-memory store; backs the orchestrator tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    pub snapshot: Option<Snapshot>,
    pub permissions: Option<PermissionsRecord>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        snapshot.validate()?;
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn save_permissions(&mut self, record: &PermissionsRecord) -> Result<(), StoreError> {
        self.permissions = Some(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
