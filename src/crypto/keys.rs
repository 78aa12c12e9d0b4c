//! Key material and key-blob loading.
//!
//! Private key blobs are PKCS#8 DER encrypted with [`cipher::encrypt`];
//! public key blobs are plain SubjectPublicKeyInfo DER.

use crate::crypto::cipher;
use crate::{LicensewardenError, Result};
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use std::fmt;
use zeroize::Zeroizing;

/// Algorithm identifier of every key this crate accepts.
pub const KEY_ALGORITHM: &str = "Ed25519";

/// Fixed key size.
pub const KEY_SIZE_BITS: usize = 256;

/// A private key plus the algorithm it was generated under.
///
/// The DER bytes are scrubbed when the key is dropped.
#[derive(Clone)]
pub struct PrivateKey {
    algorithm: String,
    der: Zeroizing<Vec<u8>>,
}

impl PrivateKey {
    /// Wrap raw PKCS#8 DER. Nothing is validated until the key is used.
    pub fn new(algorithm: impl Into<String>, der: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            der: Zeroizing::new(der),
        }
    }

    /// Export a signing key.
    pub fn from_signing_key(key: &SigningKey) -> Result<Self> {
        let document = key
            .to_pkcs8_der()
            .map_err(|e| LicensewardenError::InappropriateKey(format!("pkcs8 encode: {}", e)))?;
        Ok(Self::new(KEY_ALGORITHM, document.as_bytes().to_vec()))
    }

    /// Algorithm identifier.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// PKCS#8 DER bytes.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Parse into a fresh signing primitive.
    pub(crate) fn signing_key(&self) -> Result<SigningKey> {
        ensure_algorithm(&self.algorithm)?;
        SigningKey::from_pkcs8_der(&self.der).map_err(|e| {
            LicensewardenError::InappropriateKey(format!("not an Ed25519 private key: {}", e))
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .field("der", &"<redacted>")
            .finish()
    }
}

/// A public key plus its algorithm identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: String,
    der: Vec<u8>,
}

impl PublicKey {
    /// Wrap raw SubjectPublicKeyInfo DER. Nothing is validated until use.
    pub fn new(algorithm: impl Into<String>, der: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            der,
        }
    }

    /// Export a verifying key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Result<Self> {
        Ok(Self::new(KEY_ALGORITHM, encode_public_key(key)?))
    }

    /// Algorithm identifier.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// SubjectPublicKeyInfo DER bytes.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Parse into a fresh verifying primitive.
    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey> {
        ensure_algorithm(&self.algorithm)?;
        VerifyingKey::from_public_key_der(&self.der).map_err(|e| {
            LicensewardenError::InappropriateKey(format!("not an Ed25519 public key: {}", e))
        })
    }
}

fn ensure_algorithm(algorithm: &str) -> Result<()> {
    if algorithm == KEY_ALGORITHM {
        Ok(())
    } else {
        Err(LicensewardenError::AlgorithmUnsupported(format!(
            "key algorithm {} (expected {})",
            algorithm, KEY_ALGORITHM
        )))
    }
}

/// Decrypt and validate a private key blob.
pub fn load_private_key(encrypted: &[u8], password: &[u8]) -> Result<PrivateKey> {
    let der = cipher::decrypt(password, encrypted)?;
    let key = PrivateKey {
        algorithm: KEY_ALGORITHM.to_string(),
        der,
    };
    key.signing_key()?;
    Ok(key)
}

/// Validate a public key blob.
pub fn load_public_key(der: &[u8]) -> Result<PublicKey> {
    let key = PublicKey::new(KEY_ALGORITHM, der.to_vec());
    key.verifying_key()?;
    Ok(key)
}

/// Produce a private key blob accepted by [`load_private_key`].
pub fn encrypt_private_key(key: &SigningKey, password: &[u8]) -> Result<Vec<u8>> {
    let private = PrivateKey::from_signing_key(key)?;
    cipher::encrypt(password, private.der())
}

/// Produce a public key blob accepted by [`load_public_key`].
pub fn encode_public_key(key: &VerifyingKey) -> Result<Vec<u8>> {
    key.to_public_key_der()
        .map(|document| document.as_bytes().to_vec())
        .map_err(|e| LicensewardenError::InappropriateKey(format!("spki encode: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    #[test]
    fn private_key_blob_round_trip() {
        let blob = encrypt_private_key(&signing_key(), b"key password").unwrap();
        let loaded = load_private_key(&blob, b"key password").unwrap();
        assert_eq!(loaded.algorithm(), KEY_ALGORITHM);
        assert_eq!(
            loaded.signing_key().unwrap().to_bytes(),
            signing_key().to_bytes()
        );
    }

    #[test]
    fn private_key_wrong_password() {
        let blob = encrypt_private_key(&signing_key(), b"key password").unwrap();
        assert!(matches!(
            load_private_key(&blob, b"guess"),
            Err(LicensewardenError::DecryptionFailure(_))
        ));
    }

    #[test]
    fn encrypted_garbage_is_inappropriate() {
        let blob = cipher::encrypt(b"pw", b"definitely not DER").unwrap();
        assert!(matches!(
            load_private_key(&blob, b"pw"),
            Err(LicensewardenError::InappropriateKey(_))
        ));
    }

    #[test]
    fn public_key_blob_round_trip() {
        let verifying = signing_key().verifying_key();
        let blob = encode_public_key(&verifying).unwrap();
        let loaded = load_public_key(&blob).unwrap();
        assert_eq!(loaded.verifying_key().unwrap(), verifying);
        assert_eq!(loaded, PublicKey::from_verifying_key(&verifying).unwrap());
    }

    #[test]
    fn public_key_is_structurally_validated() {
        assert!(matches!(
            load_public_key(&[0x30, 0x03, 0x01, 0x02, 0x03]),
            Err(LicensewardenError::InappropriateKey(_))
        ));
        // raw key bytes are not SPKI
        let raw = signing_key().verifying_key().to_bytes();
        assert!(matches!(
            load_public_key(&raw),
            Err(LicensewardenError::InappropriateKey(_))
        ));
    }

    #[test]
    fn foreign_algorithm_is_unsupported() {
        let der = encode_public_key(&signing_key().verifying_key()).unwrap();
        let key = PublicKey::new("RSA", der);
        assert!(matches!(
            key.verifying_key(),
            Err(LicensewardenError::AlgorithmUnsupported(_))
        ));
    }

    #[test]
    fn debug_redacts_private_bytes() {
        let key = PrivateKey::from_signing_key(&signing_key()).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&format!("{:?}", key.der())));
    }
}
