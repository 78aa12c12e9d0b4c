//! Canonical bracketed text form.
//!
//! ```text
//! [holder][issuer][subject][issueDate][goodAfterDate][goodBeforeDate][numberOfLicenses][f1, f2]
//! ```
//!
//! This form is lossy: the product key and per-feature expiry are not
//! written, and decoded features never expire. Use [`super::binary`] when
//! the full license has to survive the trip.

use crate::license::{License, LicenseBuilder};
use crate::{LicensewardenError, Result};

/// Number of bracketed fields in the text form.
pub const FIELD_COUNT: usize = 8;

/// Separator between feature names.
pub const FEATURE_SEPARATOR: &str = ", ";

/// Render the canonical text form.
pub fn to_text(license: &License) -> String {
    license.to_string()
}

/// Render the canonical text form as bytes.
pub fn serialize(license: &License) -> Vec<u8> {
    to_text(license).into_bytes()
}

/// Parse canonical text bytes.
pub fn deserialize(bytes: &[u8]) -> Result<License> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LicensewardenError::Format(format!("license text is not UTF-8: {}", e)))?;
    from_text(text)
}

/// Parse the canonical text form positionally.
pub fn from_text(text: &str) -> Result<License> {
    let fields = split_fields(text)?;
    if fields.len() != FIELD_COUNT {
        return Err(LicensewardenError::Format(format!(
            "expected {} bracketed fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    let builder = LicenseBuilder::new()
        .with_holder(fields[0])
        .with_issuer(fields[1])
        .with_subject(fields[2])
        .with_issue_date(parse_number(fields[3], "issue_date")?)
        .with_good_after_date(parse_number(fields[4], "good_after_date")?)
        .with_good_before_date(parse_number(fields[5], "good_before_date")?)
        .with_number_of_licenses(parse_number(fields[6], "number_of_licenses")?);

    let builder = if fields[7].is_empty() {
        builder
    } else {
        fields[7]
            .split(FEATURE_SEPARATOR)
            .fold(builder, |builder, name| builder.with_feature(name))
    };

    builder.build().map_err(|e| match e {
        LicensewardenError::Construction { field, reason } => {
            LicensewardenError::Format(format!("field `{}` {}", field, reason))
        }
        other => other,
    })
}

fn split_fields(text: &str) -> Result<Vec<&str>> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut rest = text;

    while !rest.is_empty() {
        let Some(open) = rest.strip_prefix('[') else {
            return Err(LicensewardenError::Format(format!(
                "expected '[' at field {}",
                fields.len() + 1
            )));
        };
        let close = open.find(']').ok_or_else(|| {
            LicensewardenError::Format(format!("field {} is not terminated", fields.len() + 1))
        })?;
        let body = &open[..close];
        if body.contains('[') {
            return Err(LicensewardenError::Format(format!(
                "field {} contains a nested '['",
                fields.len() + 1
            )));
        }
        fields.push(body);
        rest = &open[close + 1..];
    }

    Ok(fields)
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str) -> Result<T> {
    value.parse().map_err(|_| {
        LicensewardenError::Format(format!("field `{}` is not a valid number: {}", field, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "[CN=Tim Williams, C=US, ST=AL][CN=Nick Williams, C=US, ST=TN][Simple Product Name(TM)][2348907324983][2348907325000][2348917325000][57][nickFeature1, allisonFeature2]";

    fn fixture() -> License {
        License::builder()
            .with_issuer("CN=Nick Williams, C=US, ST=TN")
            .with_holder("CN=Tim Williams, C=US, ST=AL")
            .with_subject("Simple Product Name(TM)")
            .with_issue_date(2348907324983)
            .with_good_after_date(2348907325000)
            .with_good_before_date(2348917325000)
            .with_number_of_licenses(57)
            .with_feature("nickFeature1")
            .with_feature("allisonFeature2")
            .build()
            .unwrap()
    }

    #[test]
    fn serialization_is_exact() {
        assert_eq!(serialize(&fixture()), CANONICAL.as_bytes());
    }

    #[test]
    fn deserialization_reads_fields_positionally() {
        let license = deserialize(
            b"[CN=John E. Smith, C=CA, ST=QE][CN=OurCompany, C=US, ST=KY][Cool Product, by Company][14429073214631][1443907325000][1443917325000][12][fordFeature1, chevyFeature2, hondaFeature3, toyotaFeature4]",
        )
        .unwrap();

        assert_eq!(license.holder(), "CN=John E. Smith, C=CA, ST=QE");
        assert_eq!(license.issuer(), "CN=OurCompany, C=US, ST=KY");
        assert_eq!(license.subject(), "Cool Product, by Company");
        assert_eq!(license.issue_date(), 14429073214631);
        assert_eq!(license.good_after_date(), 1443907325000);
        assert_eq!(license.good_before_date(), 1443917325000);
        assert_eq!(license.number_of_licenses(), 12);
        assert_eq!(license.features().len().unwrap(), 4);
        for name in ["fordFeature1", "chevyFeature2", "hondaFeature3", "toyotaFeature4"] {
            assert!(license.has_license_for_all_features(&[name]).unwrap());
        }
    }

    #[test]
    fn round_trip_keeps_feature_order() {
        let decoded = from_text(CANONICAL).unwrap();
        assert_eq!(to_text(&decoded), CANONICAL);
        assert_eq!(decoded, fixture());
    }

    #[test]
    fn empty_feature_list() {
        let license = from_text("[h][i][s][1][2][3][4][]").unwrap();
        assert!(license.features().is_empty().unwrap());
        assert_eq!(to_text(&license), "[h][i][s][1][2][3][4][]");
    }

    #[test]
    fn product_key_and_feature_expiry_are_dropped() {
        let license = License::builder()
            .with_product_key("5565-1039-AF89-GGX7")
            .with_holder("h")
            .with_issuer("i")
            .with_subject("s")
            .with_number_of_licenses(1)
            .with_expiring_feature("trial", 5_000)
            .build()
            .unwrap();

        let decoded = from_text(&to_text(&license)).unwrap();
        assert_eq!(decoded.product_key(), "");
        assert!(decoded.feature("trial").unwrap().unwrap().never_expires());
        assert_ne!(decoded, license);
    }

    #[test]
    fn wrong_field_count_rejected() {
        assert!(matches!(
            from_text("[h][i][s][1][2][3][4]"),
            Err(LicensewardenError::Format(_))
        ));
        assert!(matches!(
            from_text("[h][i][s][1][2][3][4][][extra]"),
            Err(LicensewardenError::Format(_))
        ));
    }

    #[test]
    fn malformed_brackets_rejected() {
        for bad in [
            "",
            "h][i][s][1][2][3][4][]",
            "[h][i][s][1][2][3][4][",
            "[h][i[x]][s][1][2][3][4][]",
            "[h][i][s][1][2][3][4][] ",
        ] {
            assert!(
                matches!(from_text(bad), Err(LicensewardenError::Format(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn bad_numbers_rejected() {
        assert!(matches!(
            from_text("[h][i][s][soon][2][3][4][]"),
            Err(LicensewardenError::Format(_))
        ));
        assert!(matches!(
            from_text("[h][i][s][1][2][3][-4][]"),
            Err(LicensewardenError::Format(_))
        ));
    }

    #[test]
    fn missing_required_value_is_a_format_error() {
        assert!(matches!(
            from_text("[][i][s][1][2][3][4][]"),
            Err(LicensewardenError::Format(_))
        ));
    }

    #[test]
    fn duplicate_feature_is_a_format_error() {
        assert!(matches!(
            from_text("[h][i][s][1][2][3][4][a, a]"),
            Err(LicensewardenError::Format(_))
        ));
    }

    #[test]
    fn unencodable_values_never_reach_the_text_form() {
        let base = || {
            License::builder()
                .with_holder("h")
                .with_issuer("i")
                .with_subject("s")
                .with_number_of_licenses(1)
        };
        assert!(base().with_feature("Reports, Export").build().is_err());
        assert!(base().with_holder("CN=Acme [EU]").build().is_err());

        let license = base()
            .with_holder("CN=Acme (EU), O=\"West\"")
            .with_subject("Suite: Pro/Team  ")
            .with_feature(" Reports Export")
            .with_feature("Ünïcode-特性")
            .build()
            .unwrap();
        let decoded = from_text(&to_text(&license)).unwrap();
        assert_eq!(decoded, license);
        assert_eq!(decoded.features().len().unwrap(), 2);
    }

    #[test]
    fn non_utf8_rejected() {
        assert!(matches!(
            deserialize(&[b'[', 0xff, b']']),
            Err(LicensewardenError::Format(_))
        ));
    }
}
