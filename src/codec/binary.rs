//! Lossless binary encoding used as the plaintext before encryption.
//!
//! Layout (big-endian):
//! ```text
//! "LWL1" | version u8 | product_key | holder | issuer | subject
//!        | issue i64 | after i64 | before i64 | seats u32
//!        | feature_count u32 | (name | good_before i64)*
//! ```
//! Strings are a u32 byte length followed by UTF-8.

use crate::license::{Feature, License, LicenseBuilder};
use crate::{LicensewardenError, Result};
use bytes::{Buf, BufMut, BytesMut};

/// Leading magic bytes.
pub const MAGIC: &[u8; 4] = b"LWL1";

/// Current layout version.
pub const VERSION: u8 = 1;

// name length prefix + expiry
const MIN_FEATURE_LEN: usize = 4 + 8;

/// Encode the full license, including product key and feature expiry.
pub fn encode(license: &License) -> Result<Vec<u8>> {
    let features = license.features().to_vec()?;

    let mut buf = BytesMut::with_capacity(128);
    buf.put_slice(MAGIC);
    buf.put_u8(VERSION);
    put_str(&mut buf, license.product_key())?;
    put_str(&mut buf, license.holder())?;
    put_str(&mut buf, license.issuer())?;
    put_str(&mut buf, license.subject())?;
    buf.put_i64(license.issue_date());
    buf.put_i64(license.good_after_date());
    buf.put_i64(license.good_before_date());
    buf.put_u32(license.number_of_licenses());

    let count = u32::try_from(features.len())
        .map_err(|_| LicensewardenError::Format("too many features".to_string()))?;
    buf.put_u32(count);
    for feature in &features {
        put_str(&mut buf, feature.name())?;
        buf.put_i64(feature.good_before_date());
    }

    Ok(buf.to_vec())
}

/// Decode bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<License> {
    let mut buf = bytes;

    need(&buf, MAGIC.len() + 1, "header")?;
    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(LicensewardenError::Format(
            "not a binary license (bad magic)".to_string(),
        ));
    }
    let version = buf.get_u8();
    if version != VERSION {
        return Err(LicensewardenError::Format(format!(
            "unsupported binary license version {}",
            version
        )));
    }

    let product_key = get_str(&mut buf, "product_key")?;
    let holder = get_str(&mut buf, "holder")?;
    let issuer = get_str(&mut buf, "issuer")?;
    let subject = get_str(&mut buf, "subject")?;

    need(&buf, 8 * 3 + 4 + 4, "dates")?;
    let issue_date = buf.get_i64();
    let good_after_date = buf.get_i64();
    let good_before_date = buf.get_i64();
    let number_of_licenses = buf.get_u32();
    let count = buf.get_u32() as usize;

    if count > buf.remaining() / MIN_FEATURE_LEN {
        return Err(LicensewardenError::Format(format!(
            "feature count {} exceeds remaining data",
            count
        )));
    }
    let mut features = Vec::with_capacity(count);
    for _ in 0..count {
        let name = get_str(&mut buf, "feature name")?;
        need(&buf, 8, "feature expiry")?;
        features.push(Feature::expiring(name, buf.get_i64()));
    }

    if buf.has_remaining() {
        return Err(LicensewardenError::Format(format!(
            "{} trailing bytes after license",
            buf.remaining()
        )));
    }

    LicenseBuilder::new()
        .with_product_key(product_key)
        .with_holder(holder)
        .with_issuer(issuer)
        .with_subject(subject)
        .with_issue_date(issue_date)
        .with_good_after_date(good_after_date)
        .with_good_before_date(good_before_date)
        .with_number_of_licenses(number_of_licenses)
        .with_features(features)
        .build()
        .map_err(|e| match e {
            LicensewardenError::Construction { field, reason } => {
                LicensewardenError::Format(format!("field `{}` {}", field, reason))
            }
            other => other,
        })
}

fn put_str(buf: &mut BytesMut, value: &str) -> Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| LicensewardenError::Format("string field too long".to_string()))?;
    buf.put_u32(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn get_str(buf: &mut &[u8], what: &str) -> Result<String> {
    need(buf, 4, what)?;
    let len = buf.get_u32() as usize;
    need(buf, len, what)?;
    let value = std::str::from_utf8(&buf[..len])
        .map_err(|e| LicensewardenError::Format(format!("{} is not UTF-8: {}", what, e)))?
        .to_string();
    buf.advance(len);
    Ok(value)
}

fn need(buf: &&[u8], len: usize, what: &str) -> Result<()> {
    if buf.remaining() < len {
        return Err(LicensewardenError::Format(format!(
            "truncated binary license while reading {}",
            what
        )));
    }
    Ok(())
}
