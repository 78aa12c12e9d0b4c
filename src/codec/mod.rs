//! Wire codecs for [`License`](crate::License).
//!
//! - [`text`] is the canonical, human-readable bracket form (lossy).
//! - [`binary`] is the full encoding that gets encrypted and signed.

pub mod binary;
pub mod text;
