//! Hierarchical role selection.

use std::collections::BTreeSet;

use crate::types::{HierarchyError, MemberModule, MemberRole, Result};

/// Roles an editor may not switch on.
///
/// Each module has a default set; the surrounding form may replace it with a
/// set derived from the route it was opened from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRestrictions {
    disabled: BTreeSet<MemberRole>,
}

impl RoleRestrictions {
    pub fn new(disabled: impl IntoIterator<Item = MemberRole>) -> Self {
        Self {
            disabled: disabled.into_iter().collect(),
        }
    }

    /// Default restrictions: titles above a member are granted by promotion only.
    pub fn for_module(module: MemberModule) -> Self {
        use MemberRole::*;
        match module {
            MemberModule::Pastor => Self::new([Copastor, Supervisor, Preacher, Disciple]),
            MemberModule::Copastor => Self::new([Pastor, Supervisor, Preacher, Disciple]),
            MemberModule::Supervisor => Self::new([Pastor, Copastor, Preacher, Disciple]),
            MemberModule::Preacher => Self::new([Pastor, Copastor, Supervisor, Disciple]),
            MemberModule::Disciple => {
                Self::new([Pastor, Copastor, Supervisor, Preacher, Treasurer])
            }
            MemberModule::FamilyGroup | MemberModule::Zone => Self::default(),
        }
    }

    pub fn is_disabled(&self, role: MemberRole) -> bool {
        self.disabled.contains(&role)
    }

    pub fn disabled(&self) -> &BTreeSet<MemberRole> {
        &self.disabled
    }
}

/// Toggle `role` in `roles`. Switching a disabled role on is refused;
/// switching any role off is allowed.
pub fn toggle_member_role(
    roles: &BTreeSet<MemberRole>,
    role: MemberRole,
    restrictions: &RoleRestrictions,
) -> Result<BTreeSet<MemberRole>> {
    let mut next = roles.clone();
    if next.remove(&role) {
        return Ok(next);
    }
    if restrictions.is_disabled(role) {
        return Err(HierarchyError::RoleDisabled(role));
    }
    next.insert(role);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_treasurer_on_preacher() {
        let roles = BTreeSet::from([MemberRole::Preacher]);
        let restrictions = RoleRestrictions::for_module(MemberModule::Preacher);

        let on = toggle_member_role(&roles, MemberRole::Treasurer, &restrictions).unwrap();
        assert!(on.contains(&MemberRole::Treasurer));
        let off = toggle_member_role(&on, MemberRole::Treasurer, &restrictions).unwrap();
        assert_eq!(off, roles);
    }

    #[test]
    fn test_disabled_role_cannot_be_switched_on() {
        let roles = BTreeSet::from([MemberRole::Preacher]);
        let restrictions = RoleRestrictions::for_module(MemberModule::Preacher);

        let err = toggle_member_role(&roles, MemberRole::Supervisor, &restrictions).unwrap_err();
        assert!(matches!(err, HierarchyError::RoleDisabled(MemberRole::Supervisor)));
    }

    #[test]
    fn test_disabled_role_can_be_switched_off() {
        let roles = BTreeSet::from([MemberRole::Preacher, MemberRole::Supervisor]);
        let restrictions = RoleRestrictions::for_module(MemberModule::Preacher);

        let next = toggle_member_role(&roles, MemberRole::Supervisor, &restrictions).unwrap();
        assert_eq!(next, BTreeSet::from([MemberRole::Preacher]));
    }
}
