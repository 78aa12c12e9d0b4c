//! Validity and access policies applied to an opened license.

pub mod access;
pub mod validator;
