//! # Licensewarden
//!
//! **Signed, encrypted, tamper-evident offline software licenses for Rust.**
//!
//! An issuer builds a [`License`], which is binary-encoded, encrypted with
//! a payload passphrase and signed with the issuer's Ed25519 key. The
//! resulting [`SignedLicense`] travels to the consumer, where a
//! [`LicenseManager`] verifies the signature before decrypting, decodes the
//! license, checks its validity window and answers feature queries.
//!
//! ## Features
//!
//! - **Ed25519 signatures** over a SHA-256 digest of the ciphertext
//! - **Argon2id + ChaCha20-Poly1305** payload and key-blob encryption
//! - **Fail-closed pipeline**: a corrupt signature, an invalid signature
//!   and a bad password are distinct errors, and none yields a license
//! - **Immutable licenses** whose feature set re-checks its own integrity
//!   on every read
//! - **Canonical text form** for display, plus a lossless binary form
//!
//! ## Quickstart
//!
//! ```no_run
//! use licensewarden::{FileLicenseStore, LicenseManager, LicensewardenConfig};
//!
//! fn main() -> Result<(), licensewarden::LicensewardenError> {
//!     let config = LicensewardenConfig::new("myapp", "myapp-licenses");
//!     let store = FileLicenseStore::new(config.store_namespace)?;
//!     let public_key = || -> licensewarden::Result<Vec<u8>> {
//!         Ok(std::fs::read("issuer.pub.der").unwrap_or_default())
//!     };
//!
//!     let manager = LicenseManager::new(config, store, public_key)?;
//!     if manager.has_license_for_all_features("customer-42", &["PRO"])? {
//!         println!("Pro features enabled");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Licensewarden protects against:
//! - **Forged licenses**: content not signed by the issuer key is rejected
//! - **Edited licenses**: any change to the ciphertext breaks the signature
//! - **Out-of-band edits**: opened licenses expose no mutable state
//!
//! Licensewarden does **not** prevent binary patching or code modification.
//! Client-side licensing can always be bypassed by a determined attacker
//! with access to the binary.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Data model
pub mod immutable;
pub mod license;

// Wire and crypto layers
pub mod codec;
pub mod crypto;

// Policy layer
pub mod guard;
pub mod policy;

// Collaborators and persistence
pub mod providers;
pub mod store;

// Issuer and consumer APIs
pub mod creator;
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::LicensewardenConfig;
pub use creator::LicenseCreator;
pub use crypto::digest::Hasher;
pub use crypto::keys::{PrivateKey, PublicKey};
pub use errors::{LicensewardenError, Result};
pub use license::{Feature, License, LicenseBuilder, SignedLicense};
pub use manager::LicenseManager;
pub use policy::access::{FeatureOperand, FeatureRestriction};
pub use policy::validator::{DefaultLicenseValidator, LicenseValidator, ValidityState};
pub use providers::{
    KeyPasswordProvider, LicenseProvider, PrivateKeyDataProvider, PublicKeyDataProvider,
};
pub use store::FileLicenseStore;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
