//! Feature restriction enforcement.
//!
//! A restriction names the features some piece of functionality needs and
//! whether all of them, or just one, must be covered by the license.

use crate::license::License;
use crate::{LicensewardenError, Result};

/// How the features of a restriction combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureOperand {
    /// Every feature must be licensed.
    #[default]
    All,
    /// At least one feature must be licensed.
    Any,
}

/// Features required to use some piece of functionality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRestriction {
    features: Vec<String>,
    operand: FeatureOperand,
}

impl FeatureRestriction {
    /// Require every feature in `features`.
    pub fn all<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(features, FeatureOperand::All)
    }

    /// Require at least one feature in `features`.
    pub fn any<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(features, FeatureOperand::Any)
    }

    /// Restriction with an explicit operand.
    pub fn new<I, S>(features: I, operand: FeatureOperand) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            operand,
        }
    }

    /// Required feature names.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// How the features combine.
    pub fn operand(&self) -> FeatureOperand {
        self.operand
    }
}

/// Check that `license` satisfies `restriction` at `now` (epoch millis).
///
/// # Returns
/// * `Ok(())` - Access granted, or the restriction names no features
/// * `Err(FeatureMissing)` - For `All`, the first feature not covered;
///   for `Any`, the first feature requested
/// * `Err(TamperDetected)` - The license features can no longer be read
pub fn check_restriction(
    license: &License,
    restriction: &FeatureRestriction,
    now: i64,
) -> Result<()> {
    let Some(first) = restriction.features.first() else {
        return Ok(());
    };

    match restriction.operand {
        FeatureOperand::All => {
            for required in &restriction.features {
                if !license.has_license_for_all_features_at(now, &[required.as_str()])? {
                    return Err(LicensewardenError::FeatureMissing {
                        feature: required.clone(),
                    });
                }
            }
            Ok(())
        }
        FeatureOperand::Any => {
            let names: Vec<&str> = restriction.features.iter().map(String::as_str).collect();
            if license.has_license_for_any_feature_at(now, &names)? {
                Ok(())
            } else {
                Err(LicensewardenError::FeatureMissing {
                    feature: first.clone(),
                })
            }
        }
    }
}
