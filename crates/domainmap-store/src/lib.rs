//! Snapshot storage
//!
//! Persists the whole domain map (domains + aliases) as one JSON file,
//! by default ~/.domainmap/state.json. Saves write a uniquely named
//! temporary file in the same directory and rename it over the target, so
//! readers see either the old or the new snapshot and never a partial one.
//! Saves through clones of one store are serialized.

use anyhow::{Context, Result};
use domainmap_router::{DomainMap, Snapshot};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default snapshot location
pub fn default_state_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".domainmap").join("state.json"))
}

/// JSON snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    /// Held across snapshot, write and rename
    save_lock: Arc<Mutex<()>>,
}

impl SnapshotStore {
    /// Create a store for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a store at the default location
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(default_state_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot
    ///
    /// A missing file is an empty snapshot.
    pub fn load(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No snapshot file, starting empty");
            return Ok(Snapshot::default());
        }

        let json = fs::read_to_string(&self.path)
            .context(format!("Failed to read snapshot file: {:?}", self.path))?;

        let snapshot: Snapshot = serde_json::from_str(&json)
            .context(format!("Failed to parse snapshot file: {:?}", self.path))?;

        debug!(
            path = ?self.path,
            domains = snapshot.domains.len(),
            aliases = snapshot.aliases.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Load the snapshot into a validated domain map
    pub fn load_map(&self) -> Result<DomainMap> {
        let snapshot = self.load()?;
        DomainMap::from_snapshot(snapshot)
            .context(format!("Invalid snapshot file: {:?}", self.path))
    }

    /// Save the snapshot, replacing the previous file atomically
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let _guard = self.lock();
        self.write(snapshot)
    }

    /// Save the current state of a domain map
    ///
    /// The snapshot is taken under the save lock, so a slower save can never
    /// replace the file with older state.
    pub fn save_map(&self, map: &DomainMap) -> Result<()> {
        let _guard = self.lock();
        self.write(&map.snapshot())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.save_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .context(format!("Failed to create state directory: {:?}", parent))?;

        let json =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;

        let mut tmp = NamedTempFile::new_in(parent)
            .context(format!("Failed to create temporary file in {:?}", parent))?;
        tmp.write_all(json.as_bytes())
            .context(format!("Failed to write snapshot file: {:?}", tmp.path()))?;
        tmp.persist(&self.path)
            .context(format!("Failed to replace snapshot file: {:?}", self.path))?;

        info!(
            path = ?self.path,
            domains = snapshot.domains.len(),
            aliases = snapshot.aliases.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}
