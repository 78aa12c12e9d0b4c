//! Temporal license validation.

use crate::clock::{Clock, SystemClock};
use crate::license::License;
use crate::{LicensewardenError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

/// Date format used in validation diagnostics.
pub const DIAGNOSTIC_DATE_FORMAT: &str = "%a, %-d %b %Y %H:%M:%S %Z (%z)";

/// Where a reference time falls relative to a license's validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityState {
    /// Before `good_after_date`.
    NotYetValid,
    /// Inside the window.
    Valid,
    /// At or after `good_before_date`.
    Expired,
}

impl ValidityState {
    /// Classify `now` (epoch millis) against the license window.
    ///
    /// The start check wins, so a license whose window is inverted and in
    /// the future is reported as not yet valid.
    pub fn classify(license: &License, now: i64) -> Self {
        if now < license.good_after_date() {
            Self::NotYetValid
        } else if now >= license.good_before_date() {
            Self::Expired
        } else {
            Self::Valid
        }
    }
}

/// Pluggable validation step run after a license has been opened.
pub trait LicenseValidator: Send + Sync {
    /// Reject the license if it cannot be used now.
    fn validate_license(&self, license: &License) -> Result<()>;
}

/// Checks the validity window against a clock.
#[derive(Clone)]
pub struct DefaultLicenseValidator {
    clock: Arc<dyn Clock>,
}

impl Default for DefaultLicenseValidator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl DefaultLicenseValidator {
    /// Validator reading the time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Validate against an explicit reference time (epoch millis).
    pub fn validate_at(&self, license: &License, now: i64) -> Result<()> {
        match ValidityState::classify(license, now) {
            ValidityState::Valid => Ok(()),
            ValidityState::NotYetValid => {
                let err = LicensewardenError::NotYetValid {
                    description: license_description(license),
                    good_after: formatted_date(license.good_after_date()),
                };
                warn!(error = %err, "License rejected");
                Err(err)
            }
            ValidityState::Expired => {
                let err = LicensewardenError::Expired {
                    description: license_description(license),
                    expired_at: formatted_date(license.good_before_date()),
                };
                warn!(error = %err, "License rejected");
                Err(err)
            }
        }
    }
}

impl LicenseValidator for DefaultLicenseValidator {
    fn validate_license(&self, license: &License) -> Result<()> {
        self.validate_at(license, self.clock.now_millis())
    }
}

impl std::fmt::Debug for DefaultLicenseValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultLicenseValidator").finish_non_exhaustive()
    }
}

/// `"<subject> license for <holder>"`.
pub fn license_description(license: &License) -> String {
    format!("{} license for {}", license.subject(), license.holder())
}

/// Render epoch millis in UTC, independent of the host locale.
pub fn formatted_date(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(date) => date.format(DIAGNOSTIC_DATE_FORMAT).to_string(),
        None => format!("{} ms", millis),
    }
}
