use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::Builder;
use tracing::{debug, warn};

use crate::error::GuideError;

/// Reads fail open: a store that cannot answer reports `false`. Writes are
/// best effort and never surface an error to the caller. Concurrent writes to
/// the same key resolve last-write-wins.
pub trait FoundStore: Send + Sync {
    fn is_found(&self, name: &str) -> bool;

    fn set_found(&self, name: &str, found: bool);
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    flags: Mutex<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FoundStore for MemoryStore {
    fn is_found(&self, name: &str) -> bool {
        self.flags
            .lock()
            .map(|flags| flags.get(name).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    fn set_found(&self, name: &str, found: bool) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.insert(name.to_string(), found);
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    found: BTreeMap<String, bool>,
}

#[derive(Debug)]
struct FileState {
    flags: BTreeMap<String, bool>,
    available: bool,
}

#[derive(Debug)]
pub struct FileStore {
    path: Utf8PathBuf,
    state: Mutex<FileState>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file is an empty store; an
    /// unreadable one leaves the store unavailable until the next successful
    /// write.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let state = match read_preferences(&path) {
            Ok(file) => FileState {
                flags: file.found,
                available: true,
            },
            Err(err) => {
                warn!(path = %path, error = %err, "preference store unavailable, treating all items as not found");
                FileState {
                    flags: BTreeMap::new(),
                    available: false,
                }
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn default_path() -> Result<Utf8PathBuf, GuideError> {
        let dirs = ProjectDirs::from("", "", "critter-guide").ok_or_else(|| {
            GuideError::Filesystem("unable to resolve data directory".to_string())
        })?;
        Utf8PathBuf::from_path_buf(dirs.data_dir().join("found.json"))
            .map_err(|_| GuideError::Filesystem("invalid data directory path".to_string()))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn persist(&self, flags: &BTreeMap<String, bool>) -> Result<(), GuideError> {
        let document = PreferencesFile {
            found: flags.clone(),
        };
        let content = serde_json::to_vec_pretty(&document)
            .map_err(|err| GuideError::StoreUnavailable(err.to_string()))?;
        write_atomic(&self.path, &content).map_err(|err| {
            GuideError::StoreUnavailable(format!("write {}: {err}", self.path))
        })
    }
}

impl FoundStore for FileStore {
    fn is_found(&self, name: &str) -> bool {
        match self.state.lock() {
            Ok(state) if state.available => state.flags.get(name).copied().unwrap_or(false),
            Ok(_) => false,
            Err(_) => {
                warn!(name, "preference store lock poisoned");
                false
            }
        }
    }

    fn set_found(&self, name: &str, found: bool) {
        let Ok(mut state) = self.state.lock() else {
            warn!(name, "preference store lock poisoned, dropping write");
            return;
        };
        state.flags.insert(name.to_string(), found);
        match self.persist(&state.flags) {
            Ok(()) => {
                state.available = true;
                debug!(name, found, "saved found flag");
            }
            Err(err) => warn!(name, found, error = %err, "dropping found flag write"),
        }
    }
}

fn read_preferences(path: &Utf8Path) -> Result<PreferencesFile, GuideError> {
    let content = match fs::read_to_string(path.as_std_path()) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PreferencesFile::default()),
        Err(err) => return Err(GuideError::StoreUnavailable(err.to_string())),
    };
    serde_json::from_str(&content).map_err(|err| GuideError::StoreUnavailable(err.to_string()))
}

fn write_atomic(path: &Utf8Path, content: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())?;
    let mut temp = Builder::new()
        .prefix("critter-guide-prefs")
        .tempfile_in(parent.as_std_path())?;
    temp.write_all(content)?;
    temp.persist(path.as_std_path()).map_err(|err| err.error)?;
    Ok(())
}
