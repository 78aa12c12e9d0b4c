//! On-disk envelope for a signed license.
//!
//! Both halves of the [`SignedLicense`] are base64-encoded into a small
//! JSON document alongside the time they were stored. The envelope carries
//! no trust of its own: the signature is re-verified on every open.

use crate::clock::Clock;
use crate::license::SignedLicense;
use crate::{LicensewardenError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON envelope around a [`SignedLicense`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLicense {
    /// Base64 of the encrypted license content.
    pub license_content: String,

    /// Base64 of the signature over the content.
    pub signature: String,

    /// When the envelope was written.
    pub stored_at: DateTime<Utc>,
}

impl StoredLicense {
    /// Wrap a signed license, stamping it with the clock's time.
    pub fn new(signed: &SignedLicense, clock: &dyn Clock) -> Self {
        Self {
            license_content: STANDARD.encode(signed.license_content()),
            signature: STANDARD.encode(signed.signature()),
            stored_at: clock.now_utc(),
        }
    }

    /// Serialize the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            LicensewardenError::StoreIO(format!("Failed to serialize license: {}", e))
        })
    }

    /// Deserialize an envelope from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            LicensewardenError::Format(format!("Failed to parse stored license: {}", e))
        })
    }

    /// Decode back into the signed license.
    pub fn to_signed_license(&self) -> Result<SignedLicense> {
        let license_content = STANDARD.decode(&self.license_content).map_err(|e| {
            LicensewardenError::Format(format!("Invalid license content base64: {}", e))
        })?;
        let signature = STANDARD
            .decode(&self.signature)
            .map_err(|e| LicensewardenError::Format(format!("Invalid signature base64: {}", e)))?;
        Ok(SignedLicense::new(license_content, signature))
    }
}
