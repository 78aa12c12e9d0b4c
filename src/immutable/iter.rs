//! Read-only iterator over an [`ImmutableSet`](super::ImmutableSet).

use crate::immutable::Liveness;
use crate::{LicensewardenError, Result};

/// Iterator that re-checks its owner's liveness on every step.
///
/// Use [`has_more`](Self::has_more) / [`try_next`](Self::try_next) for the
/// explicit protocol, or the [`Iterator`] impl, which yields
/// `Err(TamperDetected)` once and then stops.
pub struct ImmutableIter<'a, T> {
    items: &'a [T],
    position: usize,
    liveness: &'a dyn Liveness,
    tripped: bool,
}

impl<'a, T> ImmutableIter<'a, T> {
    pub(crate) fn new(items: &'a [T], liveness: &'a dyn Liveness) -> Self {
        Self {
            items,
            position: 0,
            liveness,
            tripped: false,
        }
    }

    fn check(&self) -> Result<()> {
        if self.liveness.is_valid() {
            Ok(())
        } else {
            Err(LicensewardenError::TamperDetected)
        }
    }

    /// True if another element is available.
    pub fn has_more(&self) -> Result<bool> {
        self.check()?;
        Ok(self.position < self.items.len())
    }

    /// Advance, failing with `OutOfRange` past the end.
    pub fn try_next(&mut self) -> Result<&'a T> {
        self.check()?;
        let item = self
            .items
            .get(self.position)
            .ok_or(LicensewardenError::OutOfRange)?;
        self.position += 1;
        Ok(item)
    }

    /// Removal through the iterator is never supported.
    pub fn remove(&mut self) -> Result<()> {
        Err(LicensewardenError::UnsupportedOperation("remove"))
    }
}

impl<'a, T> Iterator for ImmutableIter<'a, T> {
    type Item = Result<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tripped {
            return None;
        }
        match self.has_more() {
            Ok(true) => Some(self.try_next()),
            Ok(false) => None,
            Err(e) => {
                self.tripped = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::immutable::{ImmutableSet, Liveness};
    use crate::LicensewardenError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct MockValidObject {
        valid: AtomicBool,
    }

    impl Liveness for MockValidObject {
        fn is_valid(&self) -> bool {
            self.valid.load(Ordering::SeqCst)
        }
    }

    fn fixture() -> (Arc<MockValidObject>, ImmutableSet<&'static str>) {
        let valid = Arc::new(MockValidObject {
            valid: AtomicBool::new(true),
        });
        let set = ImmutableSet::with_liveness(
            ["HerString4", "HisString3", "MyString1", "YourString2"],
            valid.clone(),
        );
        (valid, set)
    }

    #[test]
    fn remove_not_allowed() {
        let (_valid, set) = fixture();
        let mut iter = set.iter().unwrap();
        assert!(matches!(
            iter.remove(),
            Err(LicensewardenError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn walks_in_insertion_order() {
        let (_valid, set) = fixture();
        let mut iter = set.iter().unwrap();
        let expected = ["HerString4", "HisString3", "MyString1", "YourString2"];
        let mut i = 0;
        while iter.has_more().unwrap() {
            assert_eq!(*iter.try_next().unwrap(), expected[i]);
            i += 1;
        }
        assert_eq!(i, expected.len());
    }

    #[test]
    fn next_past_end_is_out_of_range() {
        let set = ImmutableSet::new(["only"]);
        let mut iter = set.iter().unwrap();
        iter.try_next().unwrap();
        assert!(matches!(iter.try_next(), Err(LicensewardenError::OutOfRange)));
        assert!(matches!(iter.try_next(), Err(LicensewardenError::OutOfRange)));
    }

    #[test]
    fn has_more_after_tamper_fails() {
        let (valid, set) = fixture();
        let iter = set.iter().unwrap();
        valid.valid.store(false, Ordering::SeqCst);
        assert!(matches!(
            iter.has_more(),
            Err(LicensewardenError::TamperDetected)
        ));
    }

    #[test]
    fn next_after_tamper_fails() {
        let (valid, set) = fixture();
        let mut iter = set.iter().unwrap();
        valid.valid.store(false, Ordering::SeqCst);
        assert!(matches!(
            iter.try_next(),
            Err(LicensewardenError::TamperDetected)
        ));
    }

    #[test]
    fn tamper_mid_iteration_fails_in_flight_next() {
        let (valid, set) = fixture();
        let mut iter = set.iter().unwrap();
        assert!(iter.has_more().unwrap());
        iter.try_next().unwrap();
        assert!(iter.has_more().unwrap());
        iter.try_next().unwrap();
        assert!(iter.has_more().unwrap());

        valid.valid.store(false, Ordering::SeqCst);
        assert!(matches!(
            iter.try_next(),
            Err(LicensewardenError::TamperDetected)
        ));
    }

    #[test]
    fn std_iterator_yields_tamper_once_then_stops() {
        let (valid, set) = fixture();
        let mut iter = set.iter().unwrap();
        assert_eq!(*iter.next().unwrap().unwrap(), "HerString4");

        valid.valid.store(false, Ordering::SeqCst);
        assert!(matches!(
            iter.next(),
            Some(Err(LicensewardenError::TamperDetected))
        ));
        assert!(iter.next().is_none());
    }
}
