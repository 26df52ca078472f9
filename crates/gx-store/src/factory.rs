//! Memoized construction of the standard session and durable stores.
//!
//! Each [`Scope`] has an ordered list of [`BackendProbe`]s. The first access
//! to a scope runs its probes in order and keeps the first backend that is
//! available; the outcome (a store, or the list of probes that failed) is
//! cached until [`StoreFactory::reset`].

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use gx_types::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{poisoned, Backend};
use crate::config::StoreConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{StoreError, StoreResult};
use crate::file::FileBackend;
use crate::memory::MemoryBackend;
use crate::store::ExpiringStore;

/// Lifetime class of a standard store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Lives as long as the process.
    Session,
    /// Survives restarts.
    Durable,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Durable => f.write_str("durable"),
        }
    }
}

/// One way of obtaining a backend.
pub trait BackendProbe: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when this capability does not exist in the current
    /// environment; `Err` when it exists but failed to initialise.
    fn probe(&self, config: &StoreConfig) -> StoreResult<Option<Arc<dyn Backend>>>;
}

/// Always available; yields a fresh [`MemoryBackend`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryProbe;

impl BackendProbe for MemoryProbe {
    fn name(&self) -> &str {
        "memory"
    }

    fn probe(&self, config: &StoreConfig) -> StoreResult<Option<Arc<dyn Backend>>> {
        let backend = match config.quota_bytes {
            Some(quota) => MemoryBackend::with_quota(quota),
            None => MemoryBackend::new(),
        };
        Ok(Some(Arc::new(backend)))
    }
}

/// Opens a [`FileBackend`] under the configured data directory. Unavailable
/// when no data directory is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileProbe;

impl BackendProbe for FileProbe {
    fn name(&self) -> &str {
        "file"
    }

    fn probe(&self, config: &StoreConfig) -> StoreResult<Option<Arc<dyn Backend>>> {
        let Some(path) = config.durable_path() else {
            return Ok(None);
        };
        let backend = FileBackend::open(&path, config.quota_bytes)?;
        Ok(Some(Arc::new(backend)))
    }
}

#[derive(Clone)]
enum Resolution {
    Ready(Arc<ExpiringStore>),
    Unavailable(Vec<String>),
}

struct Slot {
    probes: Vec<Box<dyn BackendProbe>>,
    resolved: Mutex<Option<Resolution>>,
}

impl Slot {
    fn new(probes: Vec<Box<dyn BackendProbe>>) -> Self {
        Self {
            probes,
            resolved: Mutex::new(None),
        }
    }
}

/// Builds and memoizes the session and durable [`ExpiringStore`]s.
///
/// # Example
///
/// ```rust
/// use gx_store::{Expiry, StoreConfig, StoreFactory};
///
/// let factory = StoreFactory::new(StoreConfig::default());
/// let session = factory.session().unwrap();
/// session.write("k", &1, Expiry::Never).unwrap();
///
/// // Same instance on every access until reset.
/// assert_eq!(factory.session().unwrap().read::<i32>("k").unwrap(), Some(1));
///
/// // No data dir configured: durable storage is unavailable.
/// assert!(factory.durable().is_err());
/// ```
pub struct StoreFactory {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    session: Slot,
    durable: Slot,
}

impl StoreFactory {
    /// Factory with the default probes: memory for session, file for
    /// durable.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
            session: Slot::new(vec![Box::new(MemoryProbe)]),
            durable: Slot::new(vec![Box::new(FileProbe)]),
        }
    }

    /// Replace the probe list for `scope`. Clears any cached resolution.
    pub fn with_probes(mut self, scope: Scope, probes: Vec<Box<dyn BackendProbe>>) -> Self {
        *self.slot_mut(scope) = Slot::new(probes);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The session-scoped store.
    pub fn session(&self) -> StoreResult<Arc<ExpiringStore>> {
        self.get(Scope::Session)
    }

    /// The durable store.
    pub fn durable(&self) -> StoreResult<Arc<ExpiringStore>> {
        self.get(Scope::Durable)
    }

    /// The store for `scope`, resolving it on first access.
    pub fn get(&self, scope: Scope) -> StoreResult<Arc<ExpiringStore>> {
        let slot = self.slot(scope);
        let mut resolved = slot.resolved.lock().map_err(poisoned)?;
        let resolution = match resolved.as_ref() {
            Some(resolution) => resolution.clone(),
            None => {
                let resolution = self.resolve(scope, &slot.probes);
                *resolved = Some(resolution.clone());
                resolution
            }
        };
        match resolution {
            Resolution::Ready(store) => Ok(store),
            Resolution::Unavailable(tried) => Err(StoreError::Unavailable { scope, tried }),
        }
    }

    /// Forget cached stores so the next access probes again.
    pub fn reset(&self) {
        for slot in [&self.session, &self.durable] {
            if let Ok(mut resolved) = slot.resolved.lock() {
                *resolved = None;
            }
        }
    }

    fn resolve(&self, scope: Scope, probes: &[Box<dyn BackendProbe>]) -> Resolution {
        let mut tried = Vec::with_capacity(probes.len());
        for probe in probes {
            match probe.probe(&self.config) {
                Ok(Some(backend)) => {
                    info!(%scope, probe = probe.name(), "store backend selected");
                    let store = ExpiringStore::builder(backend)
                        .clock(Arc::clone(&self.clock))
                        .sink(Arc::clone(&self.sink))
                        .config(self.config.clone())
                        .build();
                    return Resolution::Ready(Arc::new(store));
                }
                Ok(None) => tried.push(probe.name().to_string()),
                Err(e) => {
                    warn!(%scope, probe = probe.name(), error = %e, "backend probe failed");
                    tried.push(format!("{} ({e})", probe.name()));
                }
            }
        }
        warn!(%scope, ?tried, "no storage backend available");
        Resolution::Unavailable(tried)
    }

    fn slot(&self, scope: Scope) -> &Slot {
        match scope {
            Scope::Session => &self.session,
            Scope::Durable => &self.durable,
        }
    }

    fn slot_mut(&mut self, scope: Scope) -> &mut Slot {
        match scope {
            Scope::Session => &mut self.session,
            Scope::Durable => &mut self.durable,
        }
    }
}

impl fmt::Debug for StoreFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Process-wide factory, built from [`StoreConfig::from_env`] on first use.
///
/// Call [`StoreFactory::reset`] on it to drop the cached stores.
pub fn defaults() -> &'static StoreFactory {
    static DEFAULTS: OnceLock<StoreFactory> = OnceLock::new();
    DEFAULTS.get_or_init(|| StoreFactory::new(StoreConfig::from_env()))
}
