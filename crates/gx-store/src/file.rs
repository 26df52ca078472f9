use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::backend::{check_quota, footprint_of, poisoned, Backend};
use crate::error::{StoreError, StoreResult};

/// Durable backend persisting one namespace as a single JSON object file.
///
/// The whole namespace is held in memory and the file is rewritten after
/// every mutation. Rewrites go through a temporary file in the same
/// directory followed by a rename, so a crash leaves either the old or the
/// new document on disk, never a torn one.
pub struct FileBackend {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl FileBackend {
    /// Open (or create) the namespace file at `path`.
    ///
    /// A missing file is an empty namespace. An existing file that is not a
    /// JSON object of strings is reported as [`StoreError::CorruptNamespace`].
    pub fn open(path: &Path, quota: Option<usize>) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| StoreError::CorruptNamespace {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "file backend opened");

        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
            quota,
        })
    }

    /// Path to the namespace file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(poisoned)
    }

    /// Atomically replace the file with the current contents of `map`.
    fn persist(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        let bytes =
            serde_json::to_vec(map).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Backend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.lock()?;
        check_quota(&map, key, value, self.quota)?;
        let previous = map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&map) {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.lock()?;
        let Some(old) = map.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&map) {
            map.insert(key.to_string(), old);
            return Err(e);
        }
        Ok(true)
    }

    fn delete_if(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let mut map = self.lock()?;
        if map.get(key).map(String::as_str) != Some(expected) {
            return Ok(false);
        }
        map.remove(key);
        if let Err(e) = self.persist(&map) {
            map.insert(key.to_string(), expected.to_string());
            return Err(e);
        }
        Ok(true)
    }

    fn clear(&self) -> StoreResult<()> {
        let mut map = self.lock()?;
        if map.is_empty() {
            return Ok(());
        }
        let previous = std::mem::take(&mut *map);
        if let Err(e) = self.persist(&map) {
            *map = previous;
            return Err(e);
        }
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let map = self.lock()?;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    fn footprint(&self) -> StoreResult<usize> {
        let map = self.lock()?;
        footprint_of(&map)
    }
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .field("quota", &self.quota)
            .finish()
    }
}
