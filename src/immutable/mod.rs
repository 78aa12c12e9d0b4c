//! Append-only, order-preserving containers with a tamper hook.
//!
//! Containers here never hand out mutable access to their storage. Every
//! read first asks the owner's [`Liveness`] predicate whether the owner's
//! invariants still hold, and fails with `TamperDetected` when they do not.

pub mod iter;
pub mod set;

pub use iter::ImmutableIter;
pub use set::{ImmutableSet, SetMutation};

/// Owner-supplied check consulted before every read.
pub trait Liveness: Send + Sync {
    /// Returns false once the owner's state can no longer be trusted.
    fn is_valid(&self) -> bool;
}

/// Liveness for owners that have no out-of-band write path to guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl Liveness for AlwaysValid {
    fn is_valid(&self) -> bool {
        true
    }
}

impl<F> Liveness for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_valid(&self) -> bool {
        self()
    }
}
