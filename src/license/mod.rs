//! License data model: the value object, its features, its builder, and the
//! signed envelope exchanged between issuer and consumer.

pub mod builder;
pub mod feature;
pub mod model;
pub mod signed;

pub use builder::LicenseBuilder;
pub use feature::{Feature, NEVER_EXPIRES};
pub use model::License;
pub use signed::SignedLicense;
