//! Issuer-side license signing.
//!
//! A [`LicenseCreator`] owns the providers for the issuer's key password
//! and encrypted private key. Keys are loaded for each signature and
//! scrubbed as soon as the license is sealed.
//!
//! Applications normally construct one creator at startup and pass it
//! around. [`LicenseCreator::create_instance`] offers a process-wide slot
//! for those that prefer a single shared instance.

use crate::crypto::cipher::DEFAULT_PAYLOAD_PASSPHRASE;
use crate::crypto::{keys, pipeline};
use crate::license::{License, SignedLicense};
use crate::providers::{KeyPasswordProvider, PrivateKeyDataProvider};
use crate::{LicensewardenError, Result};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

static INSTANCE: OnceCell<LicenseCreator> = OnceCell::new();

/// Signs licenses with the issuer's private key.
#[derive(Clone)]
pub struct LicenseCreator {
    password_provider: Arc<dyn KeyPasswordProvider>,
    key_provider: Arc<dyn PrivateKeyDataProvider>,
    payload_passphrase: &'static str,
}

impl LicenseCreator {
    /// Creator using the default payload passphrase.
    pub fn new<P, K>(password_provider: P, key_provider: K) -> Self
    where
        P: KeyPasswordProvider + 'static,
        K: PrivateKeyDataProvider + 'static,
    {
        Self {
            password_provider: Arc::new(password_provider),
            key_provider: Arc::new(key_provider),
            payload_passphrase: DEFAULT_PAYLOAD_PASSPHRASE,
        }
    }

    /// Encrypt payloads with `passphrase` instead of the default. Consumers
    /// must be configured with the same value.
    pub fn with_payload_passphrase(mut self, passphrase: &'static str) -> Self {
        self.payload_passphrase = passphrase;
        self
    }

    /// Create the process-wide creator on first call; later calls return
    /// the existing one and drop their arguments.
    pub fn create_instance<P, K>(password_provider: P, key_provider: K) -> &'static LicenseCreator
    where
        P: KeyPasswordProvider + 'static,
        K: PrivateKeyDataProvider + 'static,
    {
        INSTANCE.get_or_init(|| {
            debug!("Creating process-wide license creator");
            Self::new(password_provider, key_provider)
        })
    }

    /// The process-wide creator.
    pub fn instance() -> Result<&'static LicenseCreator> {
        INSTANCE.get().ok_or(LicensewardenError::CreatorNotInitialized)
    }

    /// Encode, encrypt and sign `license`.
    ///
    /// # Errors
    /// - `KeyNotFound` - A provider returned no key data
    /// - `DecryptionFailure` - The key password does not open the key blob
    /// - `InappropriateKey` - The key blob is not an Ed25519 private key
    pub fn sign_license(&self, license: &License) -> Result<SignedLicense> {
        let result = self.sign_inner(license);
        match &result {
            Ok(_) => debug!(
                subject = license.subject(),
                holder = license.holder(),
                "License signed"
            ),
            Err(e) => warn!(error = %e, "License signing failed"),
        }
        result
    }

    fn sign_inner(&self, license: &License) -> Result<SignedLicense> {
        let private_key = {
            let password = Zeroizing::new(self.password_provider.key_password()?);
            let key_data = Zeroizing::new(self.key_provider.encrypted_private_key_data()?);
            if key_data.is_empty() {
                return Err(LicensewardenError::KeyNotFound(
                    "private key data is empty".to_string(),
                ));
            }
            keys::load_private_key(&key_data, &password)?
        };

        pipeline::seal_license(license, &private_key, self.payload_passphrase.as_bytes())
    }
}

impl fmt::Debug for LicenseCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseCreator").finish_non_exhaustive()
    }
}
