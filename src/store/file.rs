//! File-based license store with atomic writes.
//!
//! Stores signed-license envelopes under `dirs::data_dir()/<namespace>/`,
//! one file per context, named by the context's hash. Uses temp file +
//! rename for atomic writes.

use crate::clock::{Clock, SystemClock};
use crate::crypto::digest::Hasher;
use crate::license::SignedLicense;
use crate::providers::LicenseProvider;
use crate::store::format::StoredLicense;
use crate::{LicensewardenError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// File-based license store.
pub struct FileLicenseStore {
    /// Directory holding the envelopes.
    store_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileLicenseStore {
    /// Open the store for `namespace` under the platform data directory.
    pub fn new(namespace: &str) -> Result<Self> {
        let base_dir = dirs::data_dir().ok_or_else(|| {
            LicensewardenError::StoreIO("Could not find data directory".to_string())
        })?;
        Self::with_path(base_dir.join(namespace))
    }

    /// Open a store rooted at an explicit directory.
    pub fn with_path(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir).map_err(|e| {
            LicensewardenError::StoreIO(format!("Failed to create store dir: {}", e))
        })?;
        Ok(Self {
            store_dir,
            clock: Arc::new(SystemClock),
        })
    }

    /// Stamp envelopes with `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Directory holding the envelopes.
    pub fn dir(&self) -> &Path {
        &self.store_dir
    }

    fn license_path(&self, context_hash: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", context_hash))
    }

    /// Save the signed license for `context` atomically.
    pub fn save(&self, context: &str, signed: &SignedLicense) -> Result<()> {
        let context_hash = Hasher::hash_for_path(context);
        let target_path = self.license_path(&context_hash);
        let temp_path = self.store_dir.join(format!("{}.tmp", context_hash));

        let json = StoredLicense::new(signed, self.clock.as_ref()).to_json()?;

        fs::write(&temp_path, &json).map_err(|e| {
            LicensewardenError::StoreIO(format!("Failed to write temp file: {}", e))
        })?;

        fs::rename(&temp_path, &target_path).map_err(|e| {
            LicensewardenError::StoreIO(format!("Failed to rename license file: {}", e))
        })?;

        debug!(path = %target_path.display(), "Stored signed license");
        Ok(())
    }

    /// Load the envelope for `context`.
    pub fn load(&self, context: &str) -> Result<Option<StoredLicense>> {
        let path = self.license_path(&Hasher::hash_for_path(context));

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|e| {
            LicensewardenError::StoreIO(format!("Failed to read license file: {}", e))
        })?;

        StoredLicense::from_json(&json).map(Some)
    }

    /// Delete the license stored for `context`.
    pub fn delete(&self, context: &str) -> Result<()> {
        let path = self.license_path(&Hasher::hash_for_path(context));

        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                LicensewardenError::StoreIO(format!("Failed to delete license: {}", e))
            })?;
        }

        Ok(())
    }

    /// Delete every stored license.
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.store_dir)
            .map_err(|e| LicensewardenError::StoreIO(format!("Failed to read store dir: {}", e)))?
        {
            let entry = entry
                .map_err(|e| LicensewardenError::StoreIO(format!("Failed to read entry: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)
                    .map_err(|e| LicensewardenError::StoreIO(format!("Failed to delete: {}", e)))?;
            }
        }
        Ok(())
    }
}

impl LicenseProvider for FileLicenseStore {
    fn signed_license(&self, context: &str) -> Result<Option<SignedLicense>> {
        match self.load(context)? {
            Some(stored) => stored.to_signed_license().map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for FileLicenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLicenseStore")
            .field("store_dir", &self.store_dir)
            .finish_non_exhaustive()
    }
}
