//! Cryptographic primitives: hashing, key loading, encryption and signatures.
//!
//! Every operation parses its key and builds its cipher or signer fresh;
//! nothing here is shared between calls.

pub mod cipher;
pub mod digest;
pub mod keys;
pub mod pipeline;
pub mod signing;
pub mod verify;
