use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Absolute instant in whole seconds since the UNIX epoch.
///
/// Used as the expiration instant of an entry. An entry stamped with `t` is
/// expired once the current time is strictly greater than `t`, so it is still
/// readable during the second `t` itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from raw UNIX seconds.
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    /// The current wall-clock second.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    /// The instant `ttl` from now, saturating at the representable maximum.
    pub fn after(ttl: Duration) -> Self {
        Self::now().saturating_add(ttl)
    }

    /// Raw UNIX seconds.
    pub const fn as_unix(&self) -> i64 {
        self.0
    }

    /// Add a duration, returning `None` on overflow.
    pub fn checked_add(&self, d: Duration) -> Option<Self> {
        let secs = i64::try_from(d.as_secs()).ok()?;
        self.0.checked_add(secs).map(Self)
    }

    /// Add a duration, clamping at `i64::MAX` seconds.
    pub fn saturating_add(&self, d: Duration) -> Self {
        self.checked_add(d).unwrap_or(Self(i64::MAX))
    }

    /// Returns `true` if an entry expiring at `self` is expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.0 < now.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}s)", self.0)
    }
}

/// Decimal seconds, the exact form written into the expiry marker.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))
    }
}
