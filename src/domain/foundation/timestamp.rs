//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC, with whole-second arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Out-of-range values collapse to the Unix epoch.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Creates a new timestamp offset by the given number of seconds.
    ///
    /// Negative values move the timestamp backwards. Offsets outside the
    /// representable range saturate at the earliest or latest instant.
    pub fn plus_secs(&self, secs: i64) -> Self {
        self.checked_plus_secs(secs).unwrap_or(if secs < 0 {
            Self(DateTime::<Utc>::MIN_UTC)
        } else {
            Self(DateTime::<Utc>::MAX_UTC)
        })
    }

    /// Offsets by `secs`, or `None` when the result is not representable.
    pub fn checked_plus_secs(&self, secs: i64) -> Option<Self> {
        Duration::try_seconds(secs)
            .and_then(|offset| self.0.checked_add_signed(offset))
            .map(Self)
    }

    /// Whole seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    pub fn seconds_since(&self, earlier: &Timestamp) -> i64 {
        self.0.signed_duration_since(earlier.0).num_seconds()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
