//! Named capability grants carried by a license.

use std::fmt;

/// Sentinel expiry for features that never expire.
pub const NEVER_EXPIRES: i64 = -1;

/// A named feature, optionally with its own expiry (epoch millis).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    name: String,
    good_before_date: i64,
}

impl Feature {
    /// A feature that never expires.
    pub fn new(name: impl Into<String>) -> Self {
        Self::expiring(name, NEVER_EXPIRES)
    }

    /// A feature valid strictly before `good_before_date`.
    pub fn expiring(name: impl Into<String>, good_before_date: i64) -> Self {
        Self {
            name: name.into(),
            good_before_date,
        }
    }

    /// Feature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expiry in epoch millis, or [`NEVER_EXPIRES`].
    pub fn good_before_date(&self) -> i64 {
        self.good_before_date
    }

    /// True if the feature carries no expiry.
    pub fn never_expires(&self) -> bool {
        self.good_before_date == NEVER_EXPIRES
    }

    /// True if the feature has expired at `now` (epoch millis).
    pub fn is_expired_at(&self, now: i64) -> bool {
        !self.never_expires() && now >= self.good_before_date
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
