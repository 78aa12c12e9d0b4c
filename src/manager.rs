//! License Manager - the consumer-side API of Licensewarden.
//!
//! The `LicenseManager` ties the pieces together:
//! - Looks up the signed license for a context through a `LicenseProvider`
//! - Verifies, decrypts and decodes it with the issuer's public key
//! - Keeps opened licenses in a short-lived in-memory cache
//! - Applies the validity window and feature checks

use crate::clock::{Clock, SystemClock};
use crate::config::LicensewardenConfig;
use crate::crypto::digest::Hasher;
use crate::crypto::{keys, pipeline};
use crate::guard;
use crate::license::License;
use crate::policy::access::{self, FeatureRestriction};
use crate::policy::validator::{DefaultLicenseValidator, LicenseValidator};
use crate::providers::{LicenseProvider, PublicKeyDataProvider};
use crate::{LicensewardenError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// An opened license and when it was opened.
#[derive(Debug, Clone)]
struct CacheEntry {
    license: License,
    cached_at: DateTime<Utc>,
}

/// Main license manager.
///
/// Create one instance per application and reuse it for all license checks.
pub struct LicenseManager {
    config: LicensewardenConfig,
    clock: Arc<dyn Clock>,
    license_provider: Arc<dyn LicenseProvider>,
    public_key_provider: Arc<dyn PublicKeyDataProvider>,
    validator: Arc<dyn LicenseValidator>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl LicenseManager {
    /// Create a new license manager with the given configuration.
    ///
    /// Uses the system clock and installs the process guard.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration validation fails.
    pub fn new<L, K>(
        config: LicensewardenConfig,
        license_provider: L,
        public_key_provider: K,
    ) -> Result<Self>
    where
        L: LicenseProvider + 'static,
        K: PublicKeyDataProvider + 'static,
    {
        config.validate()?;
        Ok(Self::with_clock(
            config,
            Arc::new(license_provider),
            Arc::new(public_key_provider),
            Arc::new(SystemClock),
        ))
    }

    /// Create a license manager with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock<L, K>(
        config: LicensewardenConfig,
        license_provider: L,
        public_key_provider: K,
        clock: Arc<dyn Clock>,
    ) -> Result<Self>
    where
        L: LicenseProvider + 'static,
        K: PublicKeyDataProvider + 'static,
    {
        config.validate()?;
        Ok(Self::with_clock(
            config,
            Arc::new(license_provider),
            Arc::new(public_key_provider),
            clock,
        ))
    }

    fn with_clock(
        config: LicensewardenConfig,
        license_provider: Arc<dyn LicenseProvider>,
        public_key_provider: Arc<dyn PublicKeyDataProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        guard::install();
        let validator = Arc::new(DefaultLicenseValidator::new(clock.clone()));

        Self {
            config,
            clock,
            license_provider,
            public_key_provider,
            validator,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the validity check applied by the `has_license_*` and
    /// `check_restriction` operations.
    pub fn with_validator(mut self, validator: Arc<dyn LicenseValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Get the verified license for `context`.
    ///
    /// Served from the cache while the entry is younger than the configured
    /// TTL; otherwise loaded from the provider, verified and decrypted.
    ///
    /// # Errors
    /// - `LicenseNotFound` - The provider has nothing for `context`
    /// - `KeyNotFound` - The public key provider returned no data
    /// - `InvalidSignature` / `CorruptSignature` - Verification failed
    /// - `DecryptionFailure` - The payload passphrase does not match
    /// - `Format` - The payload did not decode into a license
    pub fn get_license(&self, context: &str) -> Result<License> {
        let key = Hasher::hash(context);
        let now = self.clock.now_utc();

        if let Ok(cache) = self.cache.read() {
            if let Some(entry) = cache.get(&key) {
                if self.is_fresh(entry, now) {
                    debug!(product = self.config.product_name, "License cache hit");
                    return Ok(entry.license.clone());
                }
            }
        }

        debug!(product = self.config.product_name, "License cache miss");
        let license = self.load_license(context).map_err(|e| {
            warn!(product = self.config.product_name, error = %e, "License rejected");
            e
        })?;

        // Best-effort insert. If locking fails, still return the license.
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(
                key,
                CacheEntry {
                    license: license.clone(),
                    cached_at: now,
                },
            );
        }

        Ok(license)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let age_ms = now.signed_duration_since(entry.cached_at).num_milliseconds();
        age_ms >= 0 && (age_ms as u128) < self.config.cache_ttl.as_millis()
    }

    fn load_license(&self, context: &str) -> Result<License> {
        let signed = self.license_provider.signed_license(context)?.ok_or_else(|| {
            LicensewardenError::LicenseNotFound {
                context: context.to_string(),
            }
        })?;

        let key_data = self.public_key_provider.encoded_public_key_data()?;
        if key_data.is_empty() {
            return Err(LicensewardenError::KeyNotFound(
                "public key data is empty".to_string(),
            ));
        }
        let public_key = keys::load_public_key(&key_data)?;

        pipeline::open_license(
            &signed,
            &public_key,
            self.config.payload_passphrase.as_bytes(),
        )
    }

    /// Check the license's validity window.
    ///
    /// # Errors
    /// - `NotYetValid` - The window has not started
    /// - `Expired` - The window has ended
    pub fn validate_license(&self, license: &License) -> Result<()> {
        self.validator.validate_license(license)
    }

    /// True if the license for `context` is valid and covers every feature.
    pub fn has_license_for_all_features(&self, context: &str, names: &[&str]) -> Result<bool> {
        let license = self.get_license(context)?;
        self.validate_license(&license)?;
        license.has_license_for_all_features_at(self.clock.now_millis(), names)
    }

    /// True if the license for `context` is valid and covers at least one
    /// feature.
    pub fn has_license_for_any_feature(&self, context: &str, names: &[&str]) -> Result<bool> {
        let license = self.get_license(context)?;
        self.validate_license(&license)?;
        license.has_license_for_any_feature_at(self.clock.now_millis(), names)
    }

    /// Check a feature restriction against the license for `context`.
    ///
    /// # Errors
    /// Everything [`get_license`](Self::get_license) and
    /// [`validate_license`](Self::validate_license) return, plus
    /// `FeatureMissing` when the restriction is not satisfied.
    pub fn check_restriction(
        &self,
        context: &str,
        restriction: &FeatureRestriction,
    ) -> Result<()> {
        let license = self.get_license(context)?;
        self.validate_license(&license)?;
        access::check_restriction(&license, restriction, self.clock.now_millis()).map_err(|e| {
            warn!(product = self.config.product_name, error = %e, "Feature restriction failed");
            e
        })
    }

    /// Drop every cached license.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LicensewardenConfig {
        &self.config
    }
}

impl std::fmt::Debug for LicenseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{encode_public_key, PrivateKey};
    use crate::license::SignedLicense;
    use ed25519_dalek::SigningKey;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::time::Duration;

    const T0: i64 = 1_736_942_400_000;

    /// Clock shared between the test and the manager.
    struct SharedClock(AtomicI64);

    impl Clock for SharedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            DateTime::<Utc>::from_timestamp_millis(self.0.load(Ordering::SeqCst)).unwrap()
        }
    }

    fn test_config() -> LicensewardenConfig {
        let mut config = LicensewardenConfig::new("test-app", "licensewarden-test");
        config.cache_ttl = Duration::from_secs(60);
        config
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    fn license() -> License {
        License::builder()
            .with_holder("CN=Tim Williams, C=US, ST=AL")
            .with_issuer("CN=Nick Williams, C=US, ST=TN")
            .with_subject("Simple Product Name(TM)")
            .with_good_after_date(T0 - 1_000)
            .with_good_before_date(T0 + 3_600_000)
            .with_number_of_licenses(5)
            .with_feature("FEATURE1")
            .with_feature("FEATURE2")
            .with_expiring_feature("TRIAL", T0 + 1_000)
            .build()
            .unwrap()
    }

    fn signed(license: &License) -> SignedLicense {
        let key = PrivateKey::from_signing_key(&signing_key()).unwrap();
        pipeline::seal_license(
            license,
            &key,
            test_config().payload_passphrase.as_bytes(),
        )
        .unwrap()
    }

    struct Fixture {
        manager: LicenseManager,
        clock: Arc<SharedClock>,
        loads: Arc<AtomicUsize>,
    }

    fn fixture_with(stored: SignedLicense) -> Fixture {
        let clock = Arc::new(SharedClock(AtomicI64::new(T0)));
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let provider = move |context: &str| -> Result<Option<SignedLicense>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok((context == "customer-1").then(|| stored.clone()))
        };
        let public_key =
            || -> Result<Vec<u8>> { encode_public_key(&signing_key().verifying_key()) };
        let manager =
            LicenseManager::new_with_clock(test_config(), provider, public_key, clock.clone())
                .unwrap();
        Fixture {
            manager,
            clock,
            loads,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(signed(&license()))
    }

    #[test]
    fn test_license_manager_creation_installs_guard() {
        let f = fixture();
        assert_eq!(f.manager.config().product_name, "test-app");
        assert!(guard::active().is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LicensewardenConfig::new("", "ns");
        let result = LicenseManager::new(
            config,
            |_: &str| -> Result<Option<SignedLicense>> { Ok(None) },
            || -> Result<Vec<u8>> { Ok(Vec::new()) },
        );
        assert!(matches!(result, Err(LicensewardenError::ConfigError(_))));
    }

    #[test]
    fn test_get_license() {
        let f = fixture();
        assert_eq!(f.manager.get_license("customer-1").unwrap(), license());
    }

    #[test]
    fn test_get_license_not_found() {
        let f = fixture();
        let result = f.manager.get_license("customer-2");
        assert!(matches!(
            result,
            Err(LicensewardenError::LicenseNotFound { context }) if context == "customer-2"
        ));
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let f = fixture();
        f.manager.get_license("customer-1").unwrap();
        f.clock.0.fetch_add(59_000, Ordering::SeqCst);
        f.manager.get_license("customer-1").unwrap();
        assert_eq!(f.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_expires_after_ttl() {
        let f = fixture();
        f.manager.get_license("customer-1").unwrap();
        f.clock.0.fetch_add(60_000, Ordering::SeqCst);
        f.manager.get_license("customer-1").unwrap();
        assert_eq!(f.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_cache() {
        let f = fixture();
        f.manager.get_license("customer-1").unwrap();
        f.manager.clear_cache();
        f.manager.get_license("customer-1").unwrap();
        assert_eq!(f.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_tampered_license_rejected_and_not_cached() {
        let (mut content, signature) = signed(&license()).into_parts();
        content[30] ^= 0x40;
        let f = fixture_with(SignedLicense::new(content, signature));

        for _ in 0..2 {
            assert!(matches!(
                f.manager.get_license("customer-1"),
                Err(LicensewardenError::InvalidSignature)
            ));
        }
        assert_eq!(f.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_public_key() {
        let manager = LicenseManager::new(
            test_config(),
            |_: &str| -> Result<Option<SignedLicense>> { Ok(Some(signed(&license()))) },
            || -> Result<Vec<u8>> { Ok(Vec::new()) },
        )
        .unwrap();
        assert!(matches!(
            manager.get_license("customer-1"),
            Err(LicensewardenError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_feature_queries() {
        let f = fixture();
        assert!(f
            .manager
            .has_license_for_all_features("customer-1", &["FEATURE1", "FEATURE2"])
            .unwrap());
        assert!(!f
            .manager
            .has_license_for_all_features("customer-1", &["FEATURE1", "FEATURE3"])
            .unwrap());
        assert!(f
            .manager
            .has_license_for_any_feature("customer-1", &["FEATURE3", "FEATURE2"])
            .unwrap());
    }

    #[test]
    fn test_feature_expiry_follows_clock() {
        let f = fixture();
        assert!(f
            .manager
            .has_license_for_all_features("customer-1", &["TRIAL"])
            .unwrap());
        f.clock.0.fetch_add(1_000, Ordering::SeqCst);
        assert!(!f
            .manager
            .has_license_for_all_features("customer-1", &["TRIAL"])
            .unwrap());
    }

    #[test]
    fn test_expired_license_fails_feature_checks() {
        let f = fixture();
        f.clock.0.fetch_add(3_600_000, Ordering::SeqCst);
        assert!(matches!(
            f.manager.has_license_for_all_features("customer-1", &["FEATURE1"]),
            Err(LicensewardenError::Expired { .. })
        ));
        assert!(matches!(
            f.manager
                .check_restriction("customer-1", &FeatureRestriction::all(["FEATURE1"])),
            Err(LicensewardenError::Expired { .. })
        ));
    }

    #[test]
    fn test_check_restriction() {
        let f = fixture();
        f.manager
            .check_restriction("customer-1", &FeatureRestriction::any(["X", "FEATURE2"]))
            .unwrap();
        let result = f
            .manager
            .check_restriction("customer-1", &FeatureRestriction::all(["FEATURE1", "X"]));
        assert!(
            matches!(result, Err(LicensewardenError::FeatureMissing { feature }) if feature == "X")
        );
    }

    #[test]
    fn test_custom_validator() {
        struct RejectAll;
        impl LicenseValidator for RejectAll {
            fn validate_license(&self, _: &License) -> Result<()> {
                Err(LicensewardenError::AccessDenied("revoked".to_string()))
            }
        }

        let f = fixture();
        let manager = f.manager.with_validator(Arc::new(RejectAll));
        assert!(manager.get_license("customer-1").is_ok());
        assert!(matches!(
            manager.has_license_for_any_feature("customer-1", &["FEATURE1"]),
            Err(LicensewardenError::AccessDenied(_))
        ));
    }
}
