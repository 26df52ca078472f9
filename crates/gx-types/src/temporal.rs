use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wall-clock timestamp in milliseconds since the UNIX epoch.
///
/// Serializes as a bare number so it can sit directly in persisted JSON
/// (`"expiresAt": 1700000000000`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from raw epoch milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// The epoch itself.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    /// Raw epoch milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `d`, clamped at `u64::MAX`.
    pub fn saturating_add(&self, d: Duration) -> Self {
        let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }

    /// Returns `true` if this timestamp is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Milliseconds from `self` until `later`, or zero if `later` is not after `self`.
    pub fn millis_until(&self, later: &Self) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(ms: u64) -> Self {
        Self(ms)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    /// Accepts plain epoch milliseconds, optionally suffixed with `ms`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches("ms");
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))
    }
}
