//! Collaborators supplying key material and signed licenses.
//!
//! Each provider is a trait with a blanket impl for closures, so small
//! embedders can pass a closure and larger ones a type of their own.

use crate::license::SignedLicense;
use crate::Result;

/// Supplies the password protecting the issuer's private key.
///
/// The returned bytes are scrubbed by the caller as soon as the key is
/// loaded.
pub trait KeyPasswordProvider: Send + Sync {
    /// The private key password.
    fn key_password(&self) -> Result<Vec<u8>>;
}

/// Supplies the encrypted private key blob.
pub trait PrivateKeyDataProvider: Send + Sync {
    /// Encrypted PKCS#8 bytes.
    fn encrypted_private_key_data(&self) -> Result<Vec<u8>>;
}

/// Supplies the issuer's public key blob.
pub trait PublicKeyDataProvider: Send + Sync {
    /// SubjectPublicKeyInfo DER bytes.
    fn encoded_public_key_data(&self) -> Result<Vec<u8>>;
}

/// Looks up the signed license for a context (customer, installation, ...).
pub trait LicenseProvider: Send + Sync {
    /// `Ok(None)` when nothing is stored for `context`.
    fn signed_license(&self, context: &str) -> Result<Option<SignedLicense>>;
}

impl<F> KeyPasswordProvider for F
where
    F: Fn() -> Result<Vec<u8>> + Send + Sync,
{
    fn key_password(&self) -> Result<Vec<u8>> {
        self()
    }
}

impl<F> PrivateKeyDataProvider for F
where
    F: Fn() -> Result<Vec<u8>> + Send + Sync,
{
    fn encrypted_private_key_data(&self) -> Result<Vec<u8>> {
        self()
    }
}

impl<F> PublicKeyDataProvider for F
where
    F: Fn() -> Result<Vec<u8>> + Send + Sync,
{
    fn encoded_public_key_data(&self) -> Result<Vec<u8>> {
        self()
    }
}

impl<F> LicenseProvider for F
where
    F: Fn(&str) -> Result<Option<SignedLicense>> + Send + Sync,
{
    fn signed_license(&self, context: &str) -> Result<Option<SignedLicense>> {
        self(context)
    }
}
