//! Licensewarden error types.
//!
//! Every kind maps to "license rejected" for the calling application; the
//! variants only differ in the diagnostic they carry.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LicensewardenError>;

/// Errors that can occur while issuing, transporting, or validating a license.
#[derive(Debug, Error)]
pub enum LicensewardenError {
    /// A required license field is missing or a setter received an invalid value.
    #[error("Invalid license field `{field}`: {reason}")]
    Construction {
        /// The builder field that failed.
        field: &'static str,
        /// Why it failed.
        reason: String,
    },

    /// The signature or cipher algorithm is not available.
    #[error("Algorithm not supported: {0}")]
    AlgorithmUnsupported(String),

    /// Key material is structurally wrong for the operation.
    #[error("Inappropriate key: {0}")]
    InappropriateKey(String),

    /// Verification could not run to completion (malformed signature bytes).
    #[error("Corrupt signature: {0}")]
    CorruptSignature(String),

    /// Signature was well-formed but did not match the data.
    #[error("The license signature is invalid")]
    InvalidSignature,

    /// Wrong password or corrupted ciphertext.
    #[error("Decryption failed: {0}")]
    DecryptionFailure(String),

    /// Wire codec parse failure.
    #[error("Format error: {0}")]
    Format(String),

    /// The liveness predicate of an immutable container reported corruption.
    #[error("Immutable state was modified out of band")]
    TamperDetected,

    /// License validity window has not started yet.
    #[error("The {description} will not be valid until {good_after}")]
    NotYetValid {
        /// Human-readable license description.
        description: String,
        /// Formatted start of the validity window.
        good_after: String,
    },

    /// License validity window has ended.
    #[error("The {description} expired on {expired_at}")]
    Expired {
        /// Human-readable license description.
        description: String,
        /// Formatted end of the validity window.
        expired_at: String,
    },

    /// Attempted mutation of an immutable container.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Iterator advanced past its last element.
    #[error("No more elements")]
    OutOfRange,

    /// Key data could not be obtained from its provider.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// No signed license exists for the requested context.
    #[error("No license found for context `{context}`")]
    LicenseNotFound {
        /// The context the license was requested for.
        context: String,
    },

    /// The access policy refused a permission.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The process-wide guard is installed and cannot be replaced.
    #[error("Replacing the installed license guard is prohibited")]
    GuardReplacementProhibited,

    /// `LicenseCreator::instance` was called before `create_instance`.
    #[error("The license creator has not been created yet")]
    CreatorNotInitialized,

    /// A required feature is absent or expired.
    #[error("License does not cover feature: {feature}")]
    FeatureMissing {
        /// The feature that was required.
        feature: String,
    },

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// License store I/O error.
    #[error("License store I/O error: {0}")]
    StoreIO(String),
}

impl LicensewardenError {
    pub(crate) fn construction(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Construction {
            field,
            reason: reason.into(),
        }
    }
}
