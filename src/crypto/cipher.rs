//! Password-based symmetric encryption.
//!
//! Keys are derived with Argon2id under fixed parameters and a random salt,
//! then used with ChaCha20-Poly1305. Output layout:
//!
//! ```text
//! "LWE1" | salt[16] | nonce[12] | ciphertext + tag
//! ```

use crate::{LicensewardenError, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Passphrase protecting license payloads unless the config overrides it.
pub const DEFAULT_PAYLOAD_PASSPHRASE: &str = "licensewarden/payload/9f1c2e7a-4b3d";

/// Leading magic bytes of every ciphertext.
pub const MAGIC: &[u8; 4] = b"LWE1";

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

/// Fixed Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub lanes: u32,
}

/// The parameters every ciphertext is produced and opened with.
pub const KDF_PARAMS: KdfParams = KdfParams {
    memory_kib: 19 * 1024,
    iterations: 2,
    lanes: 1,
};

fn derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(
        KDF_PARAMS.memory_kib,
        KDF_PARAMS.iterations,
        KDF_PARAMS.lanes,
        Some(KEY_LEN),
    )
    .map_err(|e| LicensewardenError::AlgorithmUnsupported(format!("argon2 params: {}", e)))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password, salt, &mut key[..])
        .map_err(|e| LicensewardenError::DecryptionFailure(format!("key derivation: {}", e)))?;
    Ok(key)
}

fn new_cipher(key: &[u8]) -> Result<ChaCha20Poly1305> {
    ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| LicensewardenError::AlgorithmUnsupported(format!("chacha20poly1305: {}", e)))
}

/// Encrypt `plaintext` under `password`. Each call uses a fresh salt and nonce.
pub fn encrypt(password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt)?;
    let ciphertext = new_cipher(&key[..])?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| LicensewardenError::AlgorithmUnsupported("encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt bytes produced by [`encrypt`].
///
/// A wrong password, truncated input or any modified byte all fail with
/// [`LicensewardenError::DecryptionFailure`].
pub fn decrypt(password: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext.len() < HEADER_LEN + TAG_LEN {
        return Err(LicensewardenError::DecryptionFailure(format!(
            "ciphertext too short: {} bytes",
            ciphertext.len()
        )));
    }
    if &ciphertext[..MAGIC.len()] != MAGIC {
        return Err(LicensewardenError::DecryptionFailure(
            "missing ciphertext magic".to_string(),
        ));
    }

    let salt = &ciphertext[MAGIC.len()..MAGIC.len() + SALT_LEN];
    let nonce = &ciphertext[MAGIC.len() + SALT_LEN..HEADER_LEN];
    let body = &ciphertext[HEADER_LEN..];

    let key = derive_key(password, salt)?;
    let plaintext = new_cipher(&key[..])?
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| {
            LicensewardenError::DecryptionFailure(
                "bad password or corrupted ciphertext".to_string(),
            )
        })?;
    Ok(Zeroizing::new(plaintext))
}
