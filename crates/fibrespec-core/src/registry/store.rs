use crate::error::FibreSpecError;
use crate::registry::schema::RegistryOverlay;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Backing storage for the registry overlay.
pub trait OverlayStore: Send + Sync {
    /// Load the persisted overlay. A store with nothing saved yields the empty overlay.
    fn load(&self) -> Result<RegistryOverlay, FibreSpecError>;

    /// Replace the persisted overlay.
    fn save(&self, overlay: &RegistryOverlay) -> Result<(), FibreSpecError>;

    /// Human-readable location (for diagnostics).
    fn describe(&self) -> String;
}

/// JSON file store. Saves go through a temp file in the same directory and an
/// atomic rename, so a crash mid-write never leaves a truncated overlay.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_error(&self, reason: impl ToString) -> FibreSpecError {
        FibreSpecError::RegistryPersist {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl OverlayStore for FileStore {
    fn load(&self) -> Result<RegistryOverlay, FibreSpecError> {
        if !self.path.exists() {
            return Ok(RegistryOverlay::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            FibreSpecError::RegistryLoad {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        parse_overlay(&content, &self.path)
    }

    fn save(&self, overlay: &RegistryOverlay) -> Result<(), FibreSpecError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let json = serde_json::to_string_pretty(overlay)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.persist_error(e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| self.persist_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.persist_error(e))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse overlay JSON read from `source`.
pub fn parse_overlay(json: &str, source: &Path) -> Result<RegistryOverlay, FibreSpecError> {
    serde_json::from_str(json).map_err(|e| FibreSpecError::RegistryLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })
}

/// In-memory store: learned state lives for the run and is never written out.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    overlay: RegistryOverlay,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlay(overlay: RegistryOverlay) -> Self {
        MemoryStore {
            inner: Mutex::new(MemoryState { overlay, saves: 0 }),
        }
    }

    /// The last saved overlay.
    pub fn snapshot(&self) -> RegistryOverlay {
        self.inner.lock().overlay.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }
}

impl OverlayStore for MemoryStore {
    fn load(&self) -> Result<RegistryOverlay, FibreSpecError> {
        Ok(self.snapshot())
    }

    fn save(&self, overlay: &RegistryOverlay) -> Result<(), FibreSpecError> {
        let mut inner = self.inner.lock();
        inner.overlay = overlay.clone();
        inner.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
