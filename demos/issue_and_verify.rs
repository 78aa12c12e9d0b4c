//! Issue a license, store it, and check it from the consumer side.
//!
//! # Running
//!
//! ```bash
//! cargo run --example issue_and_verify
//! ```
//!
//! # Note
//!
//! The issuer key below is derived from a fixed seed so the example is
//! reproducible. Real issuers keep the encrypted key blob and its password
//! out of the shipped binary; consumers embed only the public key.

use ed25519_dalek::SigningKey;
use licensewarden::crypto::keys::{encode_public_key, encrypt_private_key};
use licensewarden::{
    FeatureRestriction, FileLicenseStore, License, LicenseCreator, LicenseManager,
    LicensewardenConfig, LicensewardenError,
};

const KEY_PASSWORD: &[u8] = b"issuer key password";
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn main() -> Result<(), LicensewardenError> {
    let signing_key = SigningKey::from_bytes(&[7u8; 32]);
    let private_key_blob = encrypt_private_key(&signing_key, KEY_PASSWORD)?;
    let public_key_blob = encode_public_key(&signing_key.verifying_key())?;

    // Issuer side
    let now = chrono::Utc::now().timestamp_millis();
    let license = License::builder()
        .with_product_key("5565-1039-AF89-GGX7")
        .with_issuer("CN=Example Corp, C=US")
        .with_holder("CN=Jane Customer, C=US")
        .with_subject("Example Product(TM)")
        .with_issue_date(now)
        .with_good_after_date(now - DAY_MS)
        .with_good_before_date(now + 365 * DAY_MS)
        .with_number_of_licenses(5)
        .with_feature("REPORTS")
        .with_expiring_feature("BETA_EXPORT", now + 30 * DAY_MS)
        .build()?;
    println!("Issuing: {}", license);

    let creator = LicenseCreator::new(
        || -> licensewarden::Result<Vec<u8>> { Ok(KEY_PASSWORD.to_vec()) },
        move || -> licensewarden::Result<Vec<u8>> { Ok(private_key_blob.clone()) },
    );
    let signed = creator.sign_license(&license)?;

    let temp_dir = tempfile::TempDir::new()
        .map_err(|e| LicensewardenError::StoreIO(format!("temp dir: {}", e)))?;
    let store = FileLicenseStore::with_path(temp_dir.path().to_path_buf())?;
    store.save("jane", &signed)?;
    println!("Stored signed license in {}", store.dir().display());

    // Consumer side
    let config = LicensewardenConfig::new("example-product", "example-product");
    let manager = LicenseManager::new(
        config,
        store,
        move || -> licensewarden::Result<Vec<u8>> { Ok(public_key_blob.clone()) },
    )?;

    let opened = manager.get_license("jane")?;
    manager.validate_license(&opened)?;
    println!("Verified: {} seat(s) for {}", opened.number_of_licenses(), opened.holder());

    println!(
        "REPORTS + BETA_EXPORT: {}",
        manager.has_license_for_all_features("jane", &["REPORTS", "BETA_EXPORT"])?
    );

    match manager.check_restriction("jane", &FeatureRestriction::all(["REPORTS", "ADMIN"])) {
        Ok(()) => println!("ADMIN granted"),
        Err(LicensewardenError::FeatureMissing { feature }) => {
            println!("Restriction refused: missing {}", feature)
        }
        Err(e) => return Err(e),
    }

    match manager.get_license("someone-else") {
        Err(LicensewardenError::LicenseNotFound { context }) => {
            println!("No license stored for {}", context)
        }
        other => println!("Unexpected: {:?}", other.map(|l| l.to_string())),
    }

    Ok(())
}
