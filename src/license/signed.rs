//! The signed envelope: encrypted license bytes plus their signature.

/// Encrypted license content paired with the issuer's signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLicense {
    license_content: Vec<u8>,
    signature: Vec<u8>,
}

impl SignedLicense {
    /// Pair ciphertext with its signature.
    pub fn new(license_content: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            license_content,
            signature,
        }
    }

    /// The encrypted license payload.
    pub fn license_content(&self) -> &[u8] {
        &self.license_content
    }

    /// Signature over [`license_content`](Self::license_content).
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Split into `(license_content, signature)`.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.license_content, self.signature)
    }
}
