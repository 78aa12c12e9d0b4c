//! Insertion-ordered set with no mutable access to its storage.

use crate::immutable::{AlwaysValid, ImmutableIter, Liveness};
use crate::{LicensewardenError, Result};
use std::fmt;
use std::sync::Arc;

/// Mutating set operations. [`ImmutableSet`] rejects every one of them.
pub trait SetMutation<T> {
    /// Insert an element.
    fn add(&mut self, item: T) -> Result<bool>;

    /// Remove an element.
    fn remove(&mut self, item: &T) -> Result<bool>;

    /// Remove every element.
    fn clear(&mut self) -> Result<()>;
}

/// An ordered set fixed at construction.
///
/// Element order is insertion order with duplicates dropped (first wins).
/// Reads consult the owner's [`Liveness`] before touching storage.
pub struct ImmutableSet<T> {
    items: Arc<[T]>,
    liveness: Arc<dyn Liveness>,
}

impl<T: PartialEq> ImmutableSet<T> {
    /// Build a set with no owner check.
    pub fn new<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self::with_liveness(items, Arc::new(AlwaysValid))
    }

    /// Build a set guarded by the given liveness predicate.
    pub fn with_liveness<I: IntoIterator<Item = T>>(
        items: I,
        liveness: Arc<dyn Liveness>,
    ) -> Self {
        let mut unique: Vec<T> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self::from_shared(unique.into(), liveness)
    }
}

impl<T> ImmutableSet<T> {
    /// Wrap storage the caller already deduplicated and may share with its
    /// liveness predicate.
    pub(crate) fn from_shared(items: Arc<[T]>, liveness: Arc<dyn Liveness>) -> Self {
        Self { items, liveness }
    }

    fn check(&self) -> Result<()> {
        if self.liveness.is_valid() {
            Ok(())
        } else {
            tracing::warn!("immutable set read after owner reported tampering");
            Err(LicensewardenError::TamperDetected)
        }
    }

    /// Number of elements.
    pub fn len(&self) -> Result<usize> {
        self.check()?;
        Ok(self.items.len())
    }

    /// True if the set has no elements.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Start a read-only iteration in insertion order.
    pub fn iter(&self) -> Result<ImmutableIter<'_, T>> {
        self.check()?;
        Ok(ImmutableIter::new(&self.items, self.liveness.as_ref()))
    }

    /// First element matching the predicate.
    pub fn find<P>(&self, mut predicate: P) -> Result<Option<&T>>
    where
        P: FnMut(&T) -> bool,
    {
        for item in self.iter()? {
            let item = item?;
            if predicate(item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    /// Copy the elements out, in insertion order.
    pub fn to_vec(&self) -> Result<Vec<T>>
    where
        T: Clone,
    {
        self.check()?;
        Ok(self.items.to_vec())
    }
}

impl<T: PartialEq> ImmutableSet<T> {
    /// Membership test.
    pub fn contains(&self, item: &T) -> Result<bool> {
        Ok(self.find(|candidate| candidate == item)?.is_some())
    }

    /// Set equality, ignoring order.
    pub fn set_eq(&self, other: &Self) -> Result<bool> {
        if self.len()? != other.len()? {
            return Ok(false);
        }
        for item in self.iter()? {
            if !other.contains(item?)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<T> SetMutation<T> for ImmutableSet<T> {
    fn add(&mut self, _item: T) -> Result<bool> {
        Err(LicensewardenError::UnsupportedOperation("add"))
    }

    fn remove(&mut self, _item: &T) -> Result<bool> {
        Err(LicensewardenError::UnsupportedOperation("remove"))
    }

    fn clear(&mut self) -> Result<()> {
        Err(LicensewardenError::UnsupportedOperation("clear"))
    }
}

/// Tampered sets never compare equal.
impl<T: PartialEq> PartialEq for ImmutableSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.set_eq(other).unwrap_or(false)
    }
}

impl<T: fmt::Debug> fmt::Debug for ImmutableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.liveness.is_valid() {
            f.debug_set().entries(self.items.iter()).finish()
        } else {
            f.write_str("ImmutableSet { <tampered> }")
        }
    }
}
