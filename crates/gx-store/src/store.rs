use std::sync::Arc;

use gx_types::{Clock, SystemClock, Timestamp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::StoreConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::entry::{BatchItem, Expiry, StoredEntry};
use crate::error::{StoreError, StoreResult};

/// Expiration-aware key-value store over a plain [`Backend`].
///
/// Values are any `serde`-serializable payload and are persisted as JSON.
/// Expired entries are never returned; they are purged from the backend
/// the first time a read observes them. There is no background sweep.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use gx_store::{ExpiringStore, Expiry, MemoryBackend};
///
/// let store = ExpiringStore::new(Arc::new(MemoryBackend::new()));
/// store.write("greeting", &"hello", Expiry::after_millis(60_000)).unwrap();
/// let v: Option<String> = store.read("greeting").unwrap();
/// assert_eq!(v.as_deref(), Some("hello"));
/// ```
pub struct ExpiringStore {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    config: StoreConfig,
}

impl ExpiringStore {
    /// Store over `backend` with the system clock, a tracing sink and the
    /// default configuration.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::builder(backend).build()
    }

    pub fn builder(backend: Arc<dyn Backend>) -> ExpiringStoreBuilder {
        ExpiringStoreBuilder {
            backend,
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
            config: StoreConfig::default(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store `value` at `key`, replacing whatever was there.
    ///
    /// Serialization and backend failures (including quota rejections) are
    /// returned to the caller. On success a capacity check runs when
    /// `warn_on_write` is configured.
    pub fn write<T>(&self, key: &str, value: &T, expiry: Expiry) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let value =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let entry = StoredEntry::new(value, expiry.resolve(self.clock.now()));
        let raw = entry.encode()?;
        self.backend.set(key, &raw)?;
        debug!(key, expires_at = ?entry.expires_at, bytes = raw.len(), "entry written");

        if self.config.warn_on_write {
            if let Err(e) = self.check_capacity() {
                warn!(key, error = %e, "capacity check after write failed");
            }
        }
        Ok(())
    }

    /// Write each item in order. Stops at the first failure; earlier items
    /// stay written.
    pub fn write_many<T: Serialize>(&self, items: &[BatchItem<T>]) -> StoreResult<()> {
        for item in items {
            self.write(&item.key, &item.value, item.expiry)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Read the value at `key`.
    ///
    /// Returns `Ok(None)` if the key is absent, expired, corrupt, or holds a
    /// value that does not decode as `T`. Only backend failures are errors.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        self.read_with(key, |_| {})
    }

    /// Like [`read`](Self::read), invoking `on_expired` with the key if the
    /// entry is found expired (and purged) by this call.
    pub fn read_with<T, F>(&self, key: &str, on_expired: F) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(&str),
    {
        let Some(entry) = self.load_live(key, on_expired)? else {
            return Ok(None);
        };
        match serde_json::from_value(entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "stored value does not match requested type; treating as absent");
                Ok(None)
            }
        }
    }

    /// Read each key in order.
    pub fn read_many<T, K>(&self, keys: &[K]) -> StoreResult<Vec<Option<T>>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        self.read_many_with(keys, |_| {})
    }

    /// Read each key in order, calling `on_expired` once per expired key.
    pub fn read_many_with<T, K, F>(&self, keys: &[K], mut on_expired: F) -> StoreResult<Vec<Option<T>>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
        F: FnMut(&str),
    {
        keys.iter()
            .map(|key| self.read_with(key.as_ref(), &mut on_expired))
            .collect()
    }

    /// Returns `true` if `key` holds a live entry. Purges it if expired.
    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.load_live(key, |_| {})?.is_some())
    }

    /// Deadline of the live entry at `key`; `None` if absent or never
    /// expiring. Purges the entry if expired.
    pub fn expires_at(&self, key: &str) -> StoreResult<Option<Timestamp>> {
        Ok(self.load_live(key, |_| {})?.and_then(|e| e.expires_at))
    }

    /// Fetch and decode `key`, enforcing expiration.
    fn load_live<F: FnOnce(&str)>(&self, key: &str, on_expired: F) -> StoreResult<Option<StoredEntry>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        let entry = match StoredEntry::decode(key, &raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable entry");
                return Ok(None);
            }
        };
        if entry.is_expired(self.clock.now()) {
            // Only the entry we judged expired; a concurrent rewrite survives.
            if self.backend.delete_if(key, &raw)? {
                debug!(key, expires_at = ?entry.expires_at, "expired entry purged on read");
            }
            on_expired(key);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Delete `key`. Returns whether anything was there; absent keys are a
    /// no-op.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let existed = self.backend.delete(key)?;
        if existed {
            debug!(key, "entry removed");
        }
        Ok(existed)
    }

    /// Delete each key in order. Returns how many existed.
    pub fn remove_many<K: AsRef<str>>(&self, keys: &[K]) -> StoreResult<usize> {
        let mut removed = 0;
        for key in keys {
            if self.remove(key.as_ref())? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete every entry in the namespace.
    pub fn clear(&self) -> StoreResult<()> {
        self.backend.clear()?;
        debug!(backend = self.backend.name(), "namespace cleared");
        Ok(())
    }

    /// Explicitly sweep expired entries. Returns how many were removed.
    ///
    /// Unreadable entries are left in place, as are entries rewritten since
    /// the snapshot was taken.
    pub fn purge_expired(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        let mut purged = 0;
        for (key, raw) in self.backend.entries()? {
            let expired = StoredEntry::decode(&key, &raw)
                .map(|entry| entry.is_expired(now))
                .unwrap_or(false);
            if expired && self.backend.delete_if(&key, &raw)? {
                purged += 1;
            }
        }
        debug!(purged, "expired entries purged");
        Ok(purged)
    }

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    /// Estimated bytes left in the namespace budget. Negative once the
    /// namespace has outgrown the budget.
    ///
    /// When `warn` is set and the estimate falls below `warn_threshold`, a
    /// diagnostic goes to the sink.
    pub fn remaining_capacity(&self, warn_threshold: usize, warn: bool) -> StoreResult<i64> {
        let used = self.backend.footprint()?;
        let budget = self.config.capacity_budget;
        let remaining = i64::try_from(budget)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(used).unwrap_or(i64::MAX));
        if warn && remaining < i64::try_from(warn_threshold).unwrap_or(i64::MAX) {
            self.sink.warn(&format!(
                "approaching storage limit: {remaining} of {budget} bytes remaining"
            ));
        }
        Ok(remaining)
    }

    /// [`remaining_capacity`](Self::remaining_capacity) with the configured
    /// threshold and warnings enabled.
    pub fn check_capacity(&self) -> StoreResult<i64> {
        self.remaining_capacity(self.config.warn_threshold, true)
    }
}

impl std::fmt::Debug for ExpiringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("backend", &self.backend.name())
            .field("capacity_budget", &self.config.capacity_budget)
            .finish()
    }
}

/// Builder for [`ExpiringStore`].
pub struct ExpiringStoreBuilder {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    config: StoreConfig,
}

impl ExpiringStoreBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ExpiringStore {
        ExpiringStore {
            backend: self.backend,
            clock: self.clock,
            sink: self.sink,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::memory::MemoryBackend;
    use gx_types::ManualClock;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::time::Duration;

    struct Harness {
        backend: Arc<MemoryBackend>,
        clock: Arc<ManualClock>,
        sink: Arc<RecordingSink>,
        store: ExpiringStore,
    }

    fn harness_with(backend: MemoryBackend, config: StoreConfig) -> Harness {
        let backend = Arc::new(backend);
        let clock = Arc::new(ManualClock::new(Timestamp::zero()));
        let sink = Arc::new(RecordingSink::new());
        let store = ExpiringStore::builder(backend.clone())
            .clock(clock.clone())
            .sink(sink.clone())
            .config(config)
            .build();
        Harness {
            backend,
            clock,
            sink,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryBackend::new(), StoreConfig::default())
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        id: u32,
    }

    // -----------------------------------------------------------------------
    // Core read/write
    // -----------------------------------------------------------------------

    #[test]
    fn write_then_read() {
        let h = harness();
        h.store.write("user", &json!({"name": "ada", "tags": [1, 2]}), Expiry::Never).unwrap();
        let v: Value = h.store.read("user").unwrap().expect("should exist");
        assert_eq!(v, json!({"name": "ada", "tags": [1, 2]}));
    }

    #[test]
    fn read_missing_returns_none() {
        let h = harness();
        assert!(h.store.read::<Value>("missing").unwrap().is_none());
    }

    #[test]
    fn typed_round_trip() {
        let h = harness();
        h.store.write("s", &Session { id: 1 }, Expiry::Never).unwrap();
        assert_eq!(h.store.read::<Session>("s").unwrap(), Some(Session { id: 1 }));
    }

    #[test]
    fn overwrite_replaces_never_merges() {
        let h = harness();
        h.store.write("k", &json!({"a": 1}), Expiry::Never).unwrap();
        h.store.write("k", &json!({"b": 2}), Expiry::Never).unwrap();
        let v: Value = h.store.read("k").unwrap().unwrap();
        assert_eq!(v, json!({"b": 2}));
    }

    #[test]
    fn empty_key_rejected() {
        let h = harness();
        let err = h.store.write("", &1, Expiry::Never).unwrap_err();
        assert!(matches!(err, StoreError::EmptyKey));
        assert!(h.backend.is_empty().unwrap());
    }

    #[test]
    fn unserializable_value_is_reported() {
        let h = harness();
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        let err = h.store.write("bad", &bad, Expiry::Never).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(h.backend.get("bad").unwrap().is_none());
    }

    #[test]
    fn quota_rejection_reaches_caller() {
        let h = harness_with(MemoryBackend::with_quota(32), StoreConfig::default());
        let err = h.store.write("big", &"x".repeat(100), Expiry::Never).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert!(h.store.read::<String>("big").unwrap().is_none());
    }

    #[test]
    fn raw_format_without_expiry() {
        let h = harness();
        h.store.write("k", &json!({"id": 1}), Expiry::Never).unwrap();
        assert_eq!(h.backend.get("k").unwrap().as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn envelope_format_with_expiry() {
        let h = harness();
        h.clock.set(Timestamp::from_millis(1_000));
        h.store.write("k", &json!({"id": 1}), Expiry::after_millis(500)).unwrap();
        assert_eq!(
            h.backend.get("k").unwrap().as_deref(),
            Some(r#"{"value":{"id":1},"expiresAt":1500}"#)
        );
    }

    // -----------------------------------------------------------------------
    // Expiration
    // -----------------------------------------------------------------------

    #[test]
    fn expiration_boundary() {
        let h = harness();
        h.clock.set(Timestamp::from_millis(10_000));
        h.store.write("k", &"v", Expiry::after_millis(1_000)).unwrap();

        h.clock.set(Timestamp::from_millis(10_999));
        assert_eq!(h.store.read::<String>("k").unwrap().as_deref(), Some("v"));

        h.clock.set(Timestamp::from_millis(11_001));
        assert!(h.store.read::<String>("k").unwrap().is_none());
    }

    #[test]
    fn session_scenario_with_callback() {
        let h = harness();
        h.store
            .write("session", &Session { id: 1 }, Expiry::from_parts(Some(5_000), false))
            .unwrap();

        h.clock.set(Timestamp::from_millis(4_000));
        let calls = Cell::new(0);
        let v = h.store.read_with::<Session, _>("session", |_| calls.set(calls.get() + 1)).unwrap();
        assert_eq!(v, Some(Session { id: 1 }));
        assert_eq!(calls.get(), 0);

        h.clock.set(Timestamp::from_millis(6_000));
        let v = h.store.read_with::<Session, _>("session", |_| calls.set(calls.get() + 1)).unwrap();
        assert_eq!(v, None);
        assert_eq!(calls.get(), 1);

        // Already purged: the callback does not fire again.
        let v = h.store.read_with::<Session, _>("session", |_| calls.set(calls.get() + 1)).unwrap();
        assert_eq!(v, None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exact_time_expiry() {
        let h = harness();
        h.store.write("k", &1, Expiry::from_parts(Some(2_000), true)).unwrap();
        h.clock.set(Timestamp::from_millis(2_000));
        assert_eq!(h.store.read::<i32>("k").unwrap(), Some(1));
        h.clock.set(Timestamp::from_millis(2_001));
        assert_eq!(h.store.read::<i32>("k").unwrap(), None);
    }

    #[test]
    fn expired_entries_purge_lazily() {
        let h = harness();
        h.store.write("k", &"v", Expiry::after_millis(100)).unwrap();
        h.clock.advance(Duration::from_millis(200));

        // Expired but not yet observed: still physically present.
        assert!(h.backend.get("k").unwrap().is_some());

        assert!(h.store.read::<String>("k").unwrap().is_none());
        assert!(h.backend.get("k").unwrap().is_none());
    }

    #[test]
    fn contains_and_expires_at() {
        let h = harness();
        h.store.write("forever", &1, Expiry::Never).unwrap();
        h.store.write("brief", &2, Expiry::after_millis(10)).unwrap();

        assert!(h.store.contains("forever").unwrap());
        assert_eq!(h.store.expires_at("forever").unwrap(), None);
        assert_eq!(h.store.expires_at("brief").unwrap(), Some(Timestamp::from_millis(10)));

        h.clock.advance(Duration::from_millis(11));
        assert!(!h.store.contains("brief").unwrap());
        assert!(h.backend.get("brief").unwrap().is_none());
        assert!(!h.store.contains("missing").unwrap());
    }

    #[test]
    fn purge_expired_sweeps_only_expired() {
        let h = harness();
        h.store.write("a", &1, Expiry::after_millis(10)).unwrap();
        h.store.write("b", &2, Expiry::after_millis(1_000)).unwrap();
        h.store.write("c", &3, Expiry::Never).unwrap();
        h.backend.set("corrupt", "{oops").unwrap();

        h.clock.advance(Duration::from_millis(50));
        assert_eq!(h.store.purge_expired().unwrap(), 1);
        assert_eq!(h.backend.len().unwrap(), 3);
    }

    /// Lets a second writer replace `key` right after `get` has returned the
    /// old raw value, the window between observing an expired entry and
    /// purging it.
    struct RewriteAfterGet {
        inner: MemoryBackend,
        key: &'static str,
        replacement: &'static str,
        fired: std::sync::atomic::AtomicBool,
    }

    impl RewriteAfterGet {
        fn new(key: &'static str, replacement: &'static str) -> Self {
            Self {
                inner: MemoryBackend::new(),
                key,
                replacement,
                fired: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn arm(&self) {
            self.fired.store(false, std::sync::atomic::Ordering::SeqCst);
        }

        fn disarm(&self) {
            self.fired.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl Backend for RewriteAfterGet {
        fn name(&self) -> &str {
            "rewrite-after-get"
        }

        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            let current = self.inner.get(key)?;
            if key == self.key && !self.fired.swap(true, std::sync::atomic::Ordering::SeqCst) {
                self.inner.set(key, self.replacement)?;
            }
            Ok(current)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> StoreResult<bool> {
            self.inner.delete(key)
        }

        fn delete_if(&self, key: &str, expected: &str) -> StoreResult<bool> {
            self.inner.delete_if(key, expected)
        }

        fn clear(&self) -> StoreResult<()> {
            self.inner.clear()
        }

        fn entries(&self) -> StoreResult<Vec<(String, String)>> {
            let entries = self.inner.entries()?;
            if !self.fired.swap(true, std::sync::atomic::Ordering::SeqCst) {
                self.inner.set(self.key, self.replacement)?;
            }
            Ok(entries)
        }
    }

    fn rewriting_store(backend: &Arc<RewriteAfterGet>, clock: &Arc<ManualClock>) -> ExpiringStore {
        ExpiringStore::builder(backend.clone())
            .clock(clock.clone())
            .sink(Arc::new(RecordingSink::new()))
            .build()
    }

    #[test]
    fn rewrite_during_expired_read_survives() {
        let backend = Arc::new(RewriteAfterGet::new("k", "\"fresh\""));
        let clock = Arc::new(ManualClock::new(Timestamp::zero()));
        let store = rewriting_store(&backend, &clock);

        backend.disarm();
        store.write("k", &"stale", Expiry::after_millis(10)).unwrap();
        clock.advance(Duration::from_millis(20));
        backend.arm();

        // This read saw the expired entry; the rewrite landed before the purge.
        assert!(store.read::<String>("k").unwrap().is_none());
        let v: Option<String> = store.read("k").unwrap();
        assert_eq!(v.as_deref(), Some("fresh"));
    }

    #[test]
    fn rewrite_during_sweep_survives() {
        let backend = Arc::new(RewriteAfterGet::new("k", "\"fresh\""));
        let clock = Arc::new(ManualClock::new(Timestamp::zero()));
        let store = rewriting_store(&backend, &clock);

        backend.disarm();
        store.write("k", &"stale", Expiry::after_millis(10)).unwrap();
        store.write("other", &"stale", Expiry::after_millis(10)).unwrap();
        clock.advance(Duration::from_millis(20));
        backend.arm();

        assert_eq!(store.purge_expired().unwrap(), 1);
        backend.disarm();
        let v: Option<String> = store.read("k").unwrap();
        assert_eq!(v.as_deref(), Some("fresh"));
        assert!(backend.inner.get("other").unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Corruption
    // -----------------------------------------------------------------------

    #[test]
    fn corrupt_entry_reads_as_absent() {
        let h = harness();
        h.backend.set("k", "{definitely not json").unwrap();
        assert!(h.store.read::<Value>("k").unwrap().is_none());
        // Corrupt data is not purged by the read.
        assert!(h.backend.get("k").unwrap().is_some());
    }

    #[test]
    fn type_mismatch_reads_as_absent() {
        let h = harness();
        h.store.write("k", &"text", Expiry::Never).unwrap();
        assert!(h.store.read::<Session>("k").unwrap().is_none());
        assert_eq!(h.store.read::<String>("k").unwrap().as_deref(), Some("text"));
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    #[test]
    fn remove_is_idempotent() {
        let h = harness();
        h.store.write("k", &1, Expiry::Never).unwrap();
        assert!(h.store.remove("k").unwrap());
        assert!(!h.store.remove("k").unwrap());
        assert!(!h.store.remove("never-existed").unwrap());
        assert!(h.backend.is_empty().unwrap());
    }

    #[test]
    fn clear_empties_namespace() {
        let h = harness();
        h.store.write("a", &1, Expiry::Never).unwrap();
        h.store.write("b", &2, Expiry::after_millis(5)).unwrap();
        h.store.clear().unwrap();
        assert!(h.backend.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Batch operations
    // -----------------------------------------------------------------------

    #[test]
    fn write_many_and_read_many() {
        let h = harness();
        let items = vec![
            BatchItem::new("a", 1),
            BatchItem::new("b", 2).with_expiry(Expiry::after_millis(10)),
            BatchItem::new("c", 3),
        ];
        h.store.write_many(&items).unwrap();

        h.clock.advance(Duration::from_millis(20));
        let mut expired = Vec::new();
        let values: Vec<Option<i32>> = h
            .store
            .read_many_with(&["a", "b", "c", "d"], |k| expired.push(k.to_string()))
            .unwrap();
        assert_eq!(values, vec![Some(1), None, Some(3), None]);
        assert_eq!(expired, vec!["b"]);
    }

    #[test]
    fn write_many_stops_at_first_failure() {
        let h = harness();
        let items = vec![
            BatchItem::new("first", 1),
            BatchItem::new("", 2),
            BatchItem::new("third", 3),
        ];
        let err = h.store.write_many(&items).unwrap_err();
        assert!(matches!(err, StoreError::EmptyKey));
        assert_eq!(h.store.read::<i32>("first").unwrap(), Some(1));
        assert_eq!(h.store.read::<i32>("third").unwrap(), None);
    }

    #[test]
    fn remove_many_tolerates_missing() {
        let h = harness();
        h.store.write("k1", &1, Expiry::Never).unwrap();
        let removed = h.store.remove_many(&["k1", "k2"]).unwrap();
        assert_eq!(removed, 1);
        assert!(h.store.read::<i32>("k1").unwrap().is_none());
    }

    #[test]
    fn read_many_accepts_owned_keys() {
        let h = harness();
        h.store.write("x", &"y", Expiry::Never).unwrap();
        let keys = vec!["x".to_string()];
        let values: Vec<Option<String>> = h.store.read_many(&keys).unwrap();
        assert_eq!(values, vec![Some("y".to_string())]);
    }

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    #[test]
    fn remaining_capacity_counts_namespace() {
        let h = harness();
        assert_eq!(h.store.remaining_capacity(1024, false).unwrap(), 5120 - 2);
        h.store.write("a", &1, Expiry::Never).unwrap();
        // {"a":"1"} = 9 bytes
        assert_eq!(h.store.remaining_capacity(1024, false).unwrap(), 5120 - 9);
    }

    #[test]
    fn capacity_can_go_negative() {
        let config = StoreConfig::default()
            .with_capacity_budget(16)
            .with_warn_on_write(false);
        let h = harness_with(MemoryBackend::new(), config);
        h.store.write("k", &"x".repeat(64), Expiry::Never).unwrap();
        assert!(h.store.remaining_capacity(0, false).unwrap() < 0);
    }

    #[test]
    fn warns_only_when_asked_and_below_threshold() {
        let h = harness_with(
            MemoryBackend::new(),
            StoreConfig::default().with_warn_on_write(false),
        );
        h.store.remaining_capacity(1024, true).unwrap();
        assert!(h.sink.is_empty());

        h.store.remaining_capacity(6_000, false).unwrap();
        assert!(h.sink.is_empty());

        h.store.remaining_capacity(6_000, true).unwrap();
        assert_eq!(h.sink.len(), 1);
        assert!(h.sink.messages()[0].contains("approaching storage limit"));
    }

    #[test]
    fn capacity_saturates_for_huge_budgets() {
        let config = StoreConfig::default().with_capacity_budget(usize::MAX);
        let h = harness_with(MemoryBackend::new(), config);
        assert_eq!(h.store.remaining_capacity(1024, false).unwrap(), i64::MAX - 2);
    }

    #[test]
    fn write_is_quiet_by_default() {
        let config = StoreConfig::default().with_capacity_budget(64);
        let h = harness_with(MemoryBackend::new(), config);
        h.store.write("small", &1, Expiry::Never).unwrap();
        assert!(h.sink.is_empty());
    }

    #[test]
    fn write_triggers_capacity_warning() {
        let config = StoreConfig::default()
            .with_capacity_budget(64)
            .with_warn_on_write(true);
        let h = harness_with(MemoryBackend::new(), config);
        h.store.write("small", &1, Expiry::Never).unwrap();
        // 64 - 13 < 1024: every write is under the threshold.
        assert_eq!(h.sink.len(), 1);
    }


    #[test]
    fn debug_format() {
        let h = harness();
        let debug = format!("{:?}", h.store);
        assert!(debug.contains("ExpiringStore"));
        assert!(debug.contains("memory"));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_strings(key in "[a-z]{1,12}", value in ".*") {
                let h = harness();
                h.store.write(&key, &value, Expiry::Never).unwrap();
                prop_assert_eq!(h.store.read::<String>(&key).unwrap(), Some(value));
            }

            #[test]
            fn round_trip_structures(
                key in "[a-z]{1,12}",
                ints in proptest::collection::vec(any::<i64>(), 0..8),
                flag in any::<bool>(),
                label in proptest::option::of("[ -~]{0,16}"),
            ) {
                let h = harness();
                let value = json!({"ints": ints, "flag": flag, "label": label});
                h.store.write(&key, &value, Expiry::Never).unwrap();
                prop_assert_eq!(h.store.read::<Value>(&key).unwrap(), Some(value));
            }

            #[test]
            fn live_until_deadline(ttl in 1u64..100_000, before in 0u64..100_000) {
                let h = harness();
                h.store.write("k", &7, Expiry::after_millis(ttl)).unwrap();
                h.clock.set(Timestamp::from_millis(before.min(ttl)));
                prop_assert_eq!(h.store.read::<i32>("k").unwrap(), Some(7));
                h.clock.set(Timestamp::from_millis(ttl + 1));
                prop_assert_eq!(h.store.read::<i32>("k").unwrap(), None);
            }
        }
    }
}
