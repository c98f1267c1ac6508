// World persistence for the driver.
//
// The engine never touches storage; the driver loads a snapshot through a
// `WorldStore`, ticks it, and saves it back only when the tick reports a
// change. Two stores are provided:
//
// - `JsonFileStore`: one JSON file per world. Saves write a sibling temp
//   file and rename it over the target, so a crash mid-save leaves the
//   previous snapshot intact.
// - `MemoryStore`: keeps the serialized snapshot in memory and counts saves.
//   Used by tests and by `--simulated` runs without `--world`.

use boomtown_sim::world::WorldState;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("world snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Somewhere a world snapshot lives between ticks.
pub trait WorldStore: Send + Sync {
    /// Load the stored world, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<WorldState>, StoreError>;

    fn save(&self, world: &WorldState) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

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
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl WorldStore for JsonFileStore {
    fn load(&self) -> Result<Option<WorldState>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        Ok(Some(WorldState::from_json(&json)?))
    }

    fn save(&self, world: &WorldState) -> Result<(), StoreError> {
        let json = world.to_json()?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| StoreError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl WorldStore for MemoryStore {
    fn load(&self) -> Result<Option<WorldState>, StoreError> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        match snapshot.as_deref() {
            Some(json) => Ok(Some(WorldState::from_json(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, world: &WorldState) -> Result<(), StoreError> {
        let json = world.to_json()?;
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
