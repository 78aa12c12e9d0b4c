//! The license value object.

use crate::clock::{Clock, SystemClock};
use crate::immutable::{ImmutableSet, Liveness};
use crate::license::{Feature, LicenseBuilder};
use crate::Result;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Integrity seal over a license's feature storage.
///
/// Holds the digest of the features taken at build time. The storage is an
/// immutable `Arc<[Feature]>`, so the digest is compared on the first read
/// only and the outcome is kept for every read after it.
struct FeatureSeal {
    features: Arc<[Feature]>,
    digest: [u8; 32],
    verified: OnceCell<bool>,
}

impl FeatureSeal {
    fn new(features: Arc<[Feature]>) -> Self {
        let digest = feature_digest(&features);
        Self {
            features,
            digest,
            verified: OnceCell::new(),
        }
    }
}

impl Liveness for FeatureSeal {
    fn is_valid(&self) -> bool {
        *self
            .verified
            .get_or_init(|| feature_digest(&self.features) == self.digest)
    }
}

fn feature_digest(features: &[Feature]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for feature in features {
        hasher.update((feature.name().len() as u64).to_be_bytes());
        hasher.update(feature.name().as_bytes());
        hasher.update(feature.good_before_date().to_be_bytes());
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// An immutable software license.
///
/// Built only through [`LicenseBuilder`]. Validity of the date window is
/// judged by the validator, not here.
pub struct License {
    product_key: String,
    holder: String,
    issuer: String,
    subject: String,
    issue_date: i64,
    good_after_date: i64,
    good_before_date: i64,
    number_of_licenses: u32,
    features: ImmutableSet<Feature>,
}

impl License {
    /// Start building a license.
    pub fn builder() -> LicenseBuilder {
        LicenseBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        product_key: String,
        holder: String,
        issuer: String,
        subject: String,
        issue_date: i64,
        good_after_date: i64,
        good_before_date: i64,
        number_of_licenses: u32,
        features: Vec<Feature>,
    ) -> Self {
        let storage: Arc<[Feature]> = features.into();
        let seal = Arc::new(FeatureSeal::new(storage.clone()));
        Self {
            product_key,
            holder,
            issuer,
            subject,
            issue_date,
            good_after_date,
            good_before_date,
            number_of_licenses,
            features: ImmutableSet::from_shared(storage, seal),
        }
    }

    /// Product key (may be empty).
    pub fn product_key(&self) -> &str {
        &self.product_key
    }

    /// Principal name of the license holder.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Principal name of the issuer.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// What the license is for.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issue date, epoch millis.
    pub fn issue_date(&self) -> i64 {
        self.issue_date
    }

    /// Start of the validity window, epoch millis.
    pub fn good_after_date(&self) -> i64 {
        self.good_after_date
    }

    /// End of the validity window (exclusive), epoch millis.
    pub fn good_before_date(&self) -> i64 {
        self.good_before_date
    }

    /// Seat count.
    pub fn number_of_licenses(&self) -> u32 {
        self.number_of_licenses
    }

    /// Licensed features, in insertion order.
    pub fn features(&self) -> &ImmutableSet<Feature> {
        &self.features
    }

    /// Look up a feature by name.
    pub fn feature(&self, name: &str) -> Result<Option<&Feature>> {
        self.features.find(|f| f.name() == name)
    }

    fn has_live_feature(&self, name: &str, now: i64) -> Result<bool> {
        Ok(self
            .feature(name)?
            .is_some_and(|feature| !feature.is_expired_at(now)))
    }

    /// True if every named feature is present and unexpired right now.
    pub fn has_license_for_all_features(&self, names: &[&str]) -> Result<bool> {
        self.has_license_for_all_features_at(SystemClock.now_millis(), names)
    }

    /// [`has_license_for_all_features`](Self::has_license_for_all_features)
    /// against a supplied reference time.
    pub fn has_license_for_all_features_at(&self, now: i64, names: &[&str]) -> Result<bool> {
        for name in names {
            if !self.has_live_feature(name, now)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True if at least one named feature is present and unexpired right now.
    pub fn has_license_for_any_feature(&self, names: &[&str]) -> Result<bool> {
        self.has_license_for_any_feature_at(SystemClock.now_millis(), names)
    }

    /// [`has_license_for_any_feature`](Self::has_license_for_any_feature)
    /// against a supplied reference time.
    pub fn has_license_for_any_feature_at(&self, now: i64, names: &[&str]) -> Result<bool> {
        for name in names {
            if self.has_live_feature(name, now)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Deterministic hash over the scalar fields and the feature count.
    ///
    /// Feature names do not contribute, so licenses differing only in a
    /// feature name hash alike while comparing unequal.
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn scalars_eq(&self, other: &Self) -> bool {
        self.product_key == other.product_key
            && self.holder == other.holder
            && self.issuer == other.issuer
            && self.subject == other.subject
            && self.issue_date == other.issue_date
            && self.good_after_date == other.good_after_date
            && self.good_before_date == other.good_before_date
            && self.number_of_licenses == other.number_of_licenses
    }
}

/// Deep copy: the clone gets its own feature storage and seal.
impl Clone for License {
    fn clone(&self) -> Self {
        Self::from_parts(
            self.product_key.clone(),
            self.holder.clone(),
            self.issuer.clone(),
            self.subject.clone(),
            self.issue_date,
            self.good_after_date,
            self.good_before_date,
            self.number_of_licenses,
            self.features.to_vec().unwrap_or_default(),
        )
    }
}

impl PartialEq for License {
    fn eq(&self, other: &Self) -> bool {
        self.scalars_eq(other) && self.features == other.features
    }
}

impl Eq for License {}

impl Hash for License {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.product_key.hash(state);
        self.holder.hash(state);
        self.issuer.hash(state);
        self.subject.hash(state);
        self.issue_date.hash(state);
        self.good_after_date.hash(state);
        self.good_before_date.hash(state);
        self.number_of_licenses.hash(state);
        self.features.len().unwrap_or(0).hash(state);
    }
}

/// Canonical text form.
impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}][{}][{}][{}][{}][{}][",
            self.holder,
            self.issuer,
            self.subject,
            self.issue_date,
            self.good_after_date,
            self.good_before_date,
            self.number_of_licenses
        )?;
        match self.features.iter() {
            Ok(iter) => {
                for (i, feature) in iter.enumerate() {
                    let Ok(feature) = feature else {
                        return f.write_str("<tampered>]");
                    };
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(feature.name())?;
                }
            }
            Err(_) => f.write_str("<tampered>")?,
        }
        f.write_str("]")
    }
}

impl fmt::Debug for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("License")
            .field("product_key", &self.product_key)
            .field("holder", &self.holder)
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("issue_date", &self.issue_date)
            .field("good_after_date", &self.good_after_date)
            .field("good_before_date", &self.good_before_date)
            .field("number_of_licenses", &self.number_of_licenses)
            .field("features", &self.features)
            .finish()
    }
}
