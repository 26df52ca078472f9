use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Nominal namespace budget used for capacity estimates. A conservative
/// proxy, not a real platform limit.
pub const DEFAULT_CAPACITY_BUDGET: usize = 5120;

/// Remaining capacity below which a warning is emitted.
pub const DEFAULT_WARN_THRESHOLD: usize = 1024;

/// Configuration for expiring stores and the store factory.
///
/// # Example
///
/// ```rust
/// use gx_store::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_capacity_budget(10 * 1024)
///     .with_data_dir("/tmp/gx");
/// assert_eq!(config.capacity_budget, 10 * 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bytes a namespace is assumed to have available (default: 5120).
    pub capacity_budget: usize,
    /// Warn when fewer than this many bytes remain (default: 1024).
    pub warn_threshold: usize,
    /// Run a warning capacity check after every successful write
    /// (default: off).
    pub warn_on_write: bool,
    /// Hard backend quota in bytes; writes past it fail. `None` = unlimited.
    pub quota_bytes: Option<usize>,
    /// Directory holding durable namespaces. Durable storage is unavailable
    /// without one.
    pub data_dir: Option<PathBuf>,
    /// File name of the durable namespace inside `data_dir`.
    pub durable_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity_budget: DEFAULT_CAPACITY_BUDGET,
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            warn_on_write: false,
            quota_bytes: None,
            data_dir: None,
            durable_file: "local.json".to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by `GX_DATA_DIR`, `GX_CAPACITY_BUDGET` and
    /// `GX_QUOTA_BYTES`. Unparsable numbers are ignored.
    pub fn from_env() -> Self {
        Self::default().apply_env(|name| std::env::var(name).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("GX_DATA_DIR").filter(|d| !d.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(budget) = lookup("GX_CAPACITY_BUDGET").and_then(|v| v.parse().ok()) {
            self.capacity_budget = budget;
        }
        if let Some(quota) = lookup("GX_QUOTA_BYTES").and_then(|v| v.parse().ok()) {
            self.quota_bytes = Some(quota);
        }
        self
    }

    pub fn with_capacity_budget(mut self, bytes: usize) -> Self {
        self.capacity_budget = bytes;
        self
    }

    pub fn with_warn_threshold(mut self, bytes: usize) -> Self {
        self.warn_threshold = bytes;
        self
    }

    pub fn with_warn_on_write(mut self, enabled: bool) -> Self {
        self.warn_on_write = enabled;
        self
    }

    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Full path of the durable namespace file, if a data dir is set.
    pub fn durable_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(&self.durable_file))
    }
}
