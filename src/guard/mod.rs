//! Process-wide access guard.
//!
//! Rust has no reflection to defend against, so the guard is a policy
//! object rather than a runtime hook: embedders route privileged requests
//! (swapping the guard, reaching into crate internals) through
//! [`check`], and the installed [`LicenseGuard`] refuses the ones that
//! would undermine license state before delegating to whatever policy it
//! was composed with.
//!
//! The guard is installed at most once per process. Installing again is a
//! no-op and replacing it afterwards always fails.

use crate::license::License;
use crate::manager::LicenseManager;
use crate::policy::access::FeatureRestriction;
use crate::{LicensewardenError, Result};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Path prefix shared by every type in this crate.
const CRATE_PREFIX: &str = "licensewarden::";

/// A named member of some type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    owner: String,
    name: String,
}

impl Member {
    /// Member `name` of the type at path `owner`.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Member `name` of type `T`.
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        Self::new(std::any::type_name::<T>(), name)
    }

    /// Full path of the owning type.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_protected(&self) -> bool {
        self.owner.starts_with(CRATE_PREFIX)
            && self.owner != std::any::type_name::<FeatureRestriction>()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.name)
    }
}

/// A privileged request checked against the installed policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Swap out the installed guard.
    ReplaceGuard,
    /// Bypass encapsulation of the listed members.
    SuppressAccessChecks {
        /// Members the caller wants unrestricted access to.
        targets: Vec<Member>,
    },
    /// Anything else; only the chained policy has an opinion.
    Other(String),
}

/// A policy deciding on privileged requests.
pub trait AccessPolicy: Send + Sync {
    /// `Ok(())` grants the permission.
    fn check_permission(&self, permission: &Permission) -> Result<()>;
}

impl<F> AccessPolicy for F
where
    F: Fn(&Permission) -> Result<()> + Send + Sync,
{
    fn check_permission(&self, permission: &Permission) -> Result<()> {
        self(permission)
    }
}

/// Guard protecting license state, optionally chained to a prior policy.
#[derive(Clone, Default)]
pub struct LicenseGuard {
    next: Option<Arc<dyn AccessPolicy>>,
}

impl LicenseGuard {
    /// Guard with nothing behind it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard that delegates to `next` after its own checks pass.
    pub fn compose_with(next: Arc<dyn AccessPolicy>) -> Self {
        Self { next: Some(next) }
    }
}

impl AccessPolicy for LicenseGuard {
    fn check_permission(&self, permission: &Permission) -> Result<()> {
        match permission {
            Permission::ReplaceGuard => return Err(LicensewardenError::GuardReplacementProhibited),
            Permission::SuppressAccessChecks { targets } => {
                if let Some(member) = targets.iter().find(|m| m.is_protected()) {
                    return Err(LicensewardenError::AccessDenied(format!(
                        "access to non-public member {} prohibited",
                        member
                    )));
                }
            }
            Permission::Other(_) => {}
        }

        match &self.next {
            Some(next) => next.check_permission(permission),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for LicenseGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseGuard")
            .field("chained", &self.next.is_some())
            .finish()
    }
}

/// True if `policy` already refuses at least one of the requests the
/// license guard exists to refuse, so it can stay installed as is.
pub fn is_suitable_replacement(policy: &dyn AccessPolicy) -> bool {
    let checks = [
        Permission::SuppressAccessChecks {
            targets: vec![Member::of::<License>("deserialize")],
        },
        Permission::SuppressAccessChecks {
            targets: vec![Member::of::<LicenseManager>("validate_license")],
        },
        Permission::ReplaceGuard,
    ];
    checks.iter().any(|p| policy.check_permission(p).is_err())
}

/// A once-only guard slot.
pub struct GuardSlot {
    cell: OnceCell<Arc<dyn AccessPolicy>>,
}

impl GuardSlot {
    /// Empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Install a fresh [`LicenseGuard`] unless a policy is already present.
    pub fn install(&self) -> Arc<dyn AccessPolicy> {
        self.cell
            .get_or_init(|| {
                debug!("Installing license guard");
                Arc::new(LicenseGuard::new())
            })
            .clone()
    }

    /// Install over a pre-existing policy.
    ///
    /// A suitable policy is kept as the guard; anything weaker is wrapped
    /// in a [`LicenseGuard`] that delegates to it.
    pub fn install_over(&self, existing: Arc<dyn AccessPolicy>) -> Arc<dyn AccessPolicy> {
        self.cell.get_or_init(|| guard_over(existing)).clone()
    }

    /// The installed policy, if any.
    pub fn active(&self) -> Option<Arc<dyn AccessPolicy>> {
        self.cell.get().cloned()
    }

    /// Check `permission` against the installed policy. Without one,
    /// everything is granted.
    pub fn check(&self, permission: &Permission) -> Result<()> {
        let Some(policy) = self.cell.get() else {
            return Ok(());
        };
        policy.check_permission(permission).map_err(|e| {
            warn!(error = %e, "Guard refused permission");
            e
        })
    }

    /// Install `policy` if the slot is still empty; fails once anything is
    /// installed.
    pub fn replace(&self, policy: Arc<dyn AccessPolicy>) -> Result<()> {
        let mut installed = false;
        self.cell.get_or_init(|| {
            installed = true;
            guard_over(policy)
        });
        if installed {
            Ok(())
        } else {
            warn!("Attempt to replace installed license guard");
            Err(LicensewardenError::GuardReplacementProhibited)
        }
    }
}

fn guard_over(existing: Arc<dyn AccessPolicy>) -> Arc<dyn AccessPolicy> {
    if is_suitable_replacement(existing.as_ref()) {
        debug!("Keeping pre-existing access policy as guard");
        existing
    } else {
        debug!("Installing license guard over pre-existing policy");
        Arc::new(LicenseGuard::compose_with(existing))
    }
}

impl Default for GuardSlot {
    fn default() -> Self {
        Self::new()
    }
}

static PROCESS_GUARD: GuardSlot = GuardSlot::new();

/// Install the process guard. Idempotent and safe under concurrent calls.
pub fn install() -> Arc<dyn AccessPolicy> {
    PROCESS_GUARD.install()
}

/// Install the process guard over a policy the embedder already uses.
pub fn install_over(existing: Arc<dyn AccessPolicy>) -> Arc<dyn AccessPolicy> {
    PROCESS_GUARD.install_over(existing)
}

/// The process guard, if installed.
pub fn active() -> Option<Arc<dyn AccessPolicy>> {
    PROCESS_GUARD.active()
}

/// Check a permission against the process guard.
pub fn check(permission: &Permission) -> Result<()> {
    PROCESS_GUARD.check(permission)
}

/// Replace the process guard. Fails once a guard is installed.
pub fn replace(policy: Arc<dyn AccessPolicy>) -> Result<()> {
    PROCESS_GUARD.replace(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn allow_all() -> Arc<dyn AccessPolicy> {
        Arc::new(|_: &Permission| -> Result<()> { Ok(()) })
    }

    fn suppress(member: Member) -> Permission {
        Permission::SuppressAccessChecks {
            targets: vec![member],
        }
    }

    #[test]
    fn test_guard_denies_replacement() {
        let guard = LicenseGuard::new();
        assert!(matches!(
            guard.check_permission(&Permission::ReplaceGuard),
            Err(LicensewardenError::GuardReplacementProhibited)
        ));
    }

    #[test]
    fn test_guard_denies_crate_internals() {
        let guard = LicenseGuard::new();
        let result = guard.check_permission(&suppress(Member::of::<License>("features")));
        assert!(matches!(result, Err(LicensewardenError::AccessDenied(_))));
    }

    #[test]
    fn test_guard_allows_feature_restriction_and_foreign_types() {
        let guard = LicenseGuard::new();
        guard
            .check_permission(&suppress(Member::of::<FeatureRestriction>("features")))
            .unwrap();
        guard
            .check_permission(&suppress(Member::of::<String>("vec")))
            .unwrap();
        guard
            .check_permission(&Permission::Other("exit".to_string()))
            .unwrap();
    }

    #[test]
    fn test_guard_delegates_after_own_checks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let next: Arc<dyn AccessPolicy> = Arc::new(move |p: &Permission| -> Result<()> {
            seen.fetch_add(1, Ordering::SeqCst);
            match p {
                Permission::Other(name) if name == "exec" => {
                    Err(LicensewardenError::AccessDenied("exec".to_string()))
                }
                _ => Ok(()),
            }
        });
        let guard = LicenseGuard::compose_with(next);

        guard
            .check_permission(&Permission::Other("read".to_string()))
            .unwrap();
        assert!(guard
            .check_permission(&Permission::Other("exec".to_string()))
            .is_err());
        // refused before delegation
        assert!(guard.check_permission(&Permission::ReplaceGuard).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_suitable_replacement() {
        assert!(!is_suitable_replacement(allow_all().as_ref()));
        assert!(is_suitable_replacement(&LicenseGuard::new()));
        let deny_replace = |p: &Permission| -> Result<()> {
            match p {
                Permission::ReplaceGuard => Err(LicensewardenError::GuardReplacementProhibited),
                _ => Ok(()),
            }
        };
        assert!(is_suitable_replacement(&deny_replace));
    }

    #[test]
    fn test_empty_slot_grants_everything() {
        let slot = GuardSlot::new();
        assert!(slot.active().is_none());
        slot.check(&Permission::ReplaceGuard).unwrap();
    }

    #[test]
    fn test_install_is_idempotent() {
        let slot = GuardSlot::new();
        let first = slot.install();
        let second = slot.install();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(slot.check(&Permission::ReplaceGuard).is_err());
    }

    #[test]
    fn test_install_over_weak_policy_wraps_it() {
        let slot = GuardSlot::new();
        slot.install_over(allow_all());
        assert!(matches!(
            slot.check(&suppress(Member::of::<License>("holder"))),
            Err(LicensewardenError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_install_over_suitable_policy_keeps_it() {
        let slot = GuardSlot::new();
        let existing: Arc<dyn AccessPolicy> = Arc::new(LicenseGuard::new());
        let installed = slot.install_over(existing.clone());
        assert!(Arc::ptr_eq(&installed, &existing));
    }

    #[test]
    fn test_replace_after_install_is_prohibited() {
        let slot = GuardSlot::new();
        slot.install();
        assert!(matches!(
            slot.replace(allow_all()),
            Err(LicensewardenError::GuardReplacementProhibited)
        ));
    }

    #[test]
    fn test_replace_into_empty_slot_still_guards() {
        let slot = GuardSlot::new();
        slot.replace(allow_all()).unwrap();
        assert!(slot.check(&Permission::ReplaceGuard).is_err());
        assert!(matches!(
            slot.replace(allow_all()),
            Err(LicensewardenError::GuardReplacementProhibited)
        ));
    }

    #[test]
    fn test_concurrent_install_yields_one_guard() {
        let slot = Arc::new(GuardSlot::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = slot.clone();
                std::thread::spawn(move || slot.install())
            })
            .collect();
        let guards: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(guards.iter().all(|g| Arc::ptr_eq(g, &guards[0])));
    }

    #[test]
    fn test_process_guard_is_installed_once() {
        let a = install();
        let b = install();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(active().is_some());
        assert!(matches!(
            replace(allow_all()),
            Err(LicensewardenError::GuardReplacementProhibited)
        ));
        check(&Permission::Other("read".to_string())).unwrap();
    }
}
