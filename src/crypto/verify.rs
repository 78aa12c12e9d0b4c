//! Consumer-side signature verification.

use crate::crypto::keys::PublicKey;
use crate::crypto::signing::{prehash, signature_algorithm};
use crate::{LicensewardenError, Result};
use ed25519_dalek::{Signature, Verifier, SIGNATURE_LENGTH};

/// Verify `signature` over `data`.
///
/// A signature that cannot be parsed is [`LicensewardenError::CorruptSignature`];
/// a well-formed signature that does not match is
/// [`LicensewardenError::InvalidSignature`].
pub fn verify(key: &PublicKey, data: &[u8], signature: &[u8]) -> Result<()> {
    signature_algorithm(key.algorithm())?;
    let verifying_key = key.verifying_key()?;

    let sig_array: [u8; SIGNATURE_LENGTH] = signature.try_into().map_err(|_| {
        LicensewardenError::CorruptSignature(format!(
            "expected {} signature bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        ))
    })?;
    let signature = Signature::from_bytes(&sig_array);

    verifying_key
        .verify(&prehash(data), &signature)
        .map_err(|_| LicensewardenError::InvalidSignature)
}
