use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};

/// Synchronous, string-keyed key-value substrate.
///
/// A backend is one namespace. It stores opaque strings and has no notion of
/// expiration; [`crate::ExpiringStore`] adds that on top.
///
/// All implementations must satisfy these invariants:
/// - A key maps to at most one value; `set` overwrites.
/// - `delete` and `clear` on absent data are no-ops, not errors.
/// - A rejected `set` leaves the previous state untouched.
/// - All I/O errors are propagated, never silently ignored.
pub trait Backend: Send + Sync {
    /// Short name used in logs and probe reports.
    fn name(&self) -> &str;

    /// Read the raw string stored at `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Delete `key` only if it still holds exactly `expected`, as one atomic
    /// step. Returns `true` if the entry was removed.
    fn delete_if(&self, key: &str, expected: &str) -> StoreResult<bool>;

    /// Remove every key in the namespace.
    fn clear(&self) -> StoreResult<()>;

    /// Snapshot of every entry, sorted by key.
    fn entries(&self) -> StoreResult<Vec<(String, String)>>;

    /// Number of keys currently stored.
    fn len(&self) -> StoreResult<usize> {
        Ok(self.entries()?.len())
    }

    /// Returns `true` if the namespace holds no keys.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Serialized size of the whole namespace in bytes.
    ///
    /// Measured as the compact JSON object mapping every key to its raw
    /// stored string, which is what capacity estimates are based on.
    fn footprint(&self) -> StoreResult<usize> {
        let map: BTreeMap<String, String> = self.entries()?.into_iter().collect();
        footprint_of(&map)
    }
}

/// Byte length of `map` rendered as a compact JSON object.
pub(crate) fn footprint_of(map: &BTreeMap<String, String>) -> StoreResult<usize> {
    serde_json::to_vec(map)
        .map(|bytes| bytes.len())
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Bytes `"key":"value"` contributes to the namespace object.
fn entry_len(key: &str, value: &str) -> StoreResult<usize> {
    let key = serde_json::to_vec(key).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let value = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(key.len() + 1 + value.len())
}

/// Footprint of `map` after setting `key` to `value`, without copying it.
pub(crate) fn projected_footprint(
    map: &BTreeMap<String, String>,
    key: &str,
    value: &str,
) -> StoreResult<usize> {
    let used = footprint_of(map)?;
    let added = entry_len(key, value)?;
    Ok(match map.get(key) {
        Some(old) => used - entry_len(key, old)? + added,
        None if map.is_empty() => used + added,
        // separating comma
        None => used + added + 1,
    })
}

/// Reject a write that would push the namespace past `quota` bytes.
pub(crate) fn check_quota(
    map: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> StoreResult<()> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let required = projected_footprint(map, key, value)?;
    if required > quota {
        return Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            required,
            quota,
        });
    }
    Ok(())
}

pub(crate) fn poisoned<E>(_: E) -> StoreError {
    StoreError::Backend("lock poisoned".into())
}
