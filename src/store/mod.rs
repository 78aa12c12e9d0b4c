//! Persistence for signed licenses.

pub mod file;
pub mod format;

pub use file::FileLicenseStore;
pub use format::StoredLicense;
