//! Issuer-side signatures.
//!
//! Data is digested with SHA-256 and the 32-byte digest is signed, giving
//! the `SHA256with<key algorithm>` combination.

use crate::crypto::keys::{PrivateKey, KEY_ALGORITHM};
use crate::{LicensewardenError, Result};
use ed25519_dalek::Signer;
use sha2::{Digest, Sha256};

/// Digest half of every signature algorithm name.
pub const DIGEST_ALGORITHM: &str = "SHA256";

/// Signature algorithm for a key algorithm identifier.
pub fn signature_algorithm(key_algorithm: &str) -> Result<String> {
    if key_algorithm != KEY_ALGORITHM {
        return Err(LicensewardenError::AlgorithmUnsupported(format!(
            "{}with{}",
            DIGEST_ALGORITHM, key_algorithm
        )));
    }
    Ok(format!("{}with{}", DIGEST_ALGORITHM, key_algorithm))
}

pub(crate) fn prehash(data: &[u8]) -> [u8; 32] {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(data));
    digest
}

/// Sign `data` with a freshly parsed key.
pub fn sign(key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>> {
    signature_algorithm(key.algorithm())?;
    let signing_key = key.signing_key()?;
    Ok(signing_key.sign(&prehash(data)).to_bytes().to_vec())
}
