//! Fluent construction of [`License`] values.

use crate::license::{Feature, License};
use crate::{LicensewardenError, Result};

/// Characters the text form uses to delimit fields.
const FIELD_DELIMITERS: [char; 2] = ['[', ']'];

/// Characters a feature name cannot hold: the field delimiters plus the
/// list separator.
const FEATURE_RESERVED: [char; 3] = ['[', ']', ','];

/// Builder for [`License`].
///
/// Setters never fail on their own; the first invalid value is remembered
/// and reported by [`build`](Self::build), naming the offending field.
#[derive(Debug, Clone, Default)]
pub struct LicenseBuilder {
    product_key: String,
    holder: Option<String>,
    issuer: Option<String>,
    subject: Option<String>,
    issue_date: i64,
    good_after_date: i64,
    good_before_date: i64,
    number_of_licenses: Option<u32>,
    features: Vec<Feature>,
    first_error: Option<(&'static str, String)>,
}

impl LicenseBuilder {
    /// Empty builder. Dates default to 0.
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &'static str, reason: impl Into<String>) {
        if self.first_error.is_none() {
            self.first_error = Some((field, reason.into()));
        }
    }

    fn required_text(&mut self, field: &'static str, value: String) -> Option<String> {
        if value.trim().is_empty() {
            self.reject(field, "must not be empty");
            None
        } else if value.contains(FIELD_DELIMITERS) {
            self.reject(field, "must not contain '[' or ']'");
            None
        } else {
            Some(value)
        }
    }

    fn date(&mut self, field: &'static str, value: i64) -> i64 {
        if value < 0 {
            self.reject(field, format!("must not be negative, got {}", value));
        }
        value
    }

    /// Set the product key.
    pub fn with_product_key(mut self, product_key: impl Into<String>) -> Self {
        self.product_key = product_key.into();
        self
    }

    /// Set the holder principal name.
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = self.required_text("holder", holder.into());
        self
    }

    /// Set the issuer principal name.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = self.required_text("issuer", issuer.into());
        self
    }

    /// Set the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = self.required_text("subject", subject.into());
        self
    }

    /// Set the issue date (epoch millis).
    pub fn with_issue_date(mut self, issue_date: i64) -> Self {
        self.issue_date = self.date("issue_date", issue_date);
        self
    }

    /// Set the start of the validity window (epoch millis).
    pub fn with_good_after_date(mut self, good_after_date: i64) -> Self {
        self.good_after_date = self.date("good_after_date", good_after_date);
        self
    }

    /// Set the end of the validity window (epoch millis, exclusive).
    pub fn with_good_before_date(mut self, good_before_date: i64) -> Self {
        self.good_before_date = self.date("good_before_date", good_before_date);
        self
    }

    /// Set the seat count.
    pub fn with_number_of_licenses(mut self, number_of_licenses: u32) -> Self {
        self.number_of_licenses = Some(number_of_licenses);
        self
    }

    /// Add a feature that never expires.
    pub fn with_feature(self, name: impl Into<String>) -> Self {
        self.with_feature_value(Feature::new(name))
    }

    /// Add a feature that expires at `good_before_date` (epoch millis).
    pub fn with_expiring_feature(self, name: impl Into<String>, good_before_date: i64) -> Self {
        self.with_feature_value(Feature::expiring(name, good_before_date))
    }

    /// Add a prepared feature.
    pub fn with_feature_value(mut self, feature: Feature) -> Self {
        if feature.name().trim().is_empty() {
            self.reject("features", "feature name must not be empty");
        } else if feature.name().contains(FEATURE_RESERVED) {
            self.reject(
                "features",
                format!("feature `{}` contains '[', ']' or ','", feature.name()),
            );
        } else if feature.good_before_date() < 0 && !feature.never_expires() {
            self.reject(
                "features",
                format!("feature `{}` has a negative expiry", feature.name()),
            );
        } else if self.features.iter().any(|f| f.name() == feature.name()) {
            self.reject(
                "features",
                format!("feature `{}` added more than once", feature.name()),
            );
        } else {
            self.features.push(feature);
        }
        self
    }

    /// Add several features.
    pub fn with_features<I: IntoIterator<Item = Feature>>(self, features: I) -> Self {
        features
            .into_iter()
            .fold(self, |builder, feature| builder.with_feature_value(feature))
    }

    /// Produce the license, or the first construction error.
    pub fn build(self) -> Result<License> {
        if let Some((field, reason)) = self.first_error {
            return Err(LicensewardenError::construction(field, reason));
        }

        let issuer = self
            .issuer
            .ok_or_else(|| LicensewardenError::construction("issuer", "is required"))?;
        let holder = self
            .holder
            .ok_or_else(|| LicensewardenError::construction("holder", "is required"))?;
        let subject = self
            .subject
            .ok_or_else(|| LicensewardenError::construction("subject", "is required"))?;
        let number_of_licenses = self.number_of_licenses.ok_or_else(|| {
            LicensewardenError::construction("number_of_licenses", "is required")
        })?;

        Ok(License::from_parts(
            self.product_key,
            holder,
            issuer,
            subject,
            self.issue_date,
            self.good_after_date,
            self.good_before_date,
            number_of_licenses,
            self.features,
        ))
    }
}

impl From<&License> for LicenseBuilder {
    fn from(license: &License) -> Self {
        Self::new()
            .with_product_key(license.product_key())
            .with_holder(license.holder())
            .with_issuer(license.issuer())
            .with_subject(license.subject())
            .with_issue_date(license.issue_date())
            .with_good_after_date(license.good_after_date())
            .with_good_before_date(license.good_before_date())
            .with_number_of_licenses(license.number_of_licenses())
    }
}
