//! Licensewarden configuration.

use crate::crypto::cipher::DEFAULT_PAYLOAD_PASSPHRASE;
use std::time::Duration;

/// Configuration for consuming licenses.
///
/// Holds product-specific settings shared by the manager and the store.
#[derive(Debug, Clone)]
pub struct LicensewardenConfig {
    /// Product name (e.g., "shimmy", "crabcamera"), used in diagnostics.
    pub product_name: &'static str,

    /// Password protecting license payloads.
    /// SECURITY: This should be hard-coded in your application, not from environment.
    pub payload_passphrase: &'static str,

    /// Store namespace for signed license files.
    /// Each product should use a unique namespace to avoid collisions.
    pub store_namespace: &'static str,

    /// How long a verified license stays in the manager's cache.
    pub cache_ttl: Duration,
}

impl LicensewardenConfig {
    /// Build a configuration with the default payload passphrase and a
    /// five minute cache.
    pub fn new(product_name: &'static str, store_namespace: &'static str) -> Self {
        Self {
            product_name,
            payload_passphrase: DEFAULT_PAYLOAD_PASSPHRASE,
            store_namespace,
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::LicensewardenError> {
        if self.product_name.is_empty() {
            return Err(crate::LicensewardenError::ConfigError(
                "product_name cannot be empty".to_string(),
            ));
        }
        if self.payload_passphrase.is_empty() {
            return Err(crate::LicensewardenError::ConfigError(
                "payload_passphrase cannot be empty".to_string(),
            ));
        }
        if self.store_namespace.is_empty() {
            return Err(crate::LicensewardenError::ConfigError(
                "store_namespace cannot be empty".to_string(),
            ));
        }
        if self.store_namespace.contains(['/', '\\'])
            || self.store_namespace == "."
            || self.store_namespace == ".."
        {
            return Err(crate::LicensewardenError::ConfigError(format!(
                "store_namespace must be a single path component, got {}",
                self.store_namespace
            )));
        }
        Ok(())
    }
}
