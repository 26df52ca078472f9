use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::backend::{check_quota, footprint_of, poisoned, Backend};
use crate::error::StoreResult;

/// In-memory, `BTreeMap`-based backend.
///
/// Used for session-scoped stores and tests. Data is lost when the backend
/// is dropped. An optional byte quota makes it behave like a size-limited
/// platform store.
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Create a new empty backend with no quota.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: None,
        }
    }

    /// Create a new empty backend that rejects writes past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: Some(quota),
        }
    }

    /// The configured quota, if any.
    pub fn quota(&self) -> Option<usize> {
        self.quota
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(poisoned)?;
        check_quota(&map, key, value, self.quota)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.entries.write().map_err(poisoned)?;
        Ok(map.remove(key).is_some())
    }

    fn delete_if(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let mut map = self.entries.write().map_err(poisoned)?;
        if map.get(key).map(String::as_str) != Some(expected) {
            return Ok(false);
        }
        map.remove(key);
        Ok(true)
    }

    fn clear(&self) -> StoreResult<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let map = self.entries.read().map_err(poisoned)?;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    fn footprint(&self) -> StoreResult<usize> {
        let map = self.entries.read().map_err(poisoned)?;
        footprint_of(&map)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("MemoryBackend")
            .field("entry_count", &count)
            .field("quota", &self.quota)
            .finish()
    }
}
