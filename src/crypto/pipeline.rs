//! Sealing pipeline composing the codec, cipher and signature steps.
//!
//! Sealing:
//! 1. Binary-encode the license
//! 2. Encrypt the encoding with the payload password
//! 3. Sign the ciphertext
//!
//! Opening runs the same steps in reverse and always verifies the signature
//! before attempting decryption.

use crate::codec::binary;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::{cipher, signing, verify};
use crate::license::{License, SignedLicense};
use crate::Result;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Encrypt and sign a license.
pub fn seal_license(
    license: &License,
    private_key: &PrivateKey,
    payload_password: &[u8],
) -> Result<SignedLicense> {
    let plaintext = Zeroizing::new(binary::encode(license)?);
    let license_content = cipher::encrypt(payload_password, &plaintext)?;
    let signature = signing::sign(private_key, &license_content)?;

    debug!(
        subject = license.subject(),
        bytes = license_content.len(),
        "License sealed"
    );
    Ok(SignedLicense::new(license_content, signature))
}

/// Verify, decrypt and decode a signed license.
pub fn open_license(
    signed: &SignedLicense,
    public_key: &PublicKey,
    payload_password: &[u8],
) -> Result<License> {
    if let Err(e) = verify::verify(public_key, signed.license_content(), signed.signature()) {
        warn!(error = %e, "Signed license rejected");
        return Err(e);
    }

    let plaintext = cipher::decrypt(payload_password, signed.license_content())?;
    let license = binary::decode(&plaintext)?;

    debug!(subject = license.subject(), "License opened");
    Ok(license)
}
