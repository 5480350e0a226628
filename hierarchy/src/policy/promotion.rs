//! Promotion rule table.
//!
//! A rule says which role a module may be promoted from and to, and which
//! ministry role qualifies a ministry-bearing member for it.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use super::PolicyError;
use crate::types::{HierarchyError, MemberModule, MemberRole, MinistryRole, RelationType};

/// What makes a member eligible for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PromotionTrigger {
    /// Operator marked the member as a promotion candidate
    CandidateFlag,
    /// A complete ministry block holds this role
    MinistryRole(MinistryRole),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PromotionRule {
    pub module: MemberModule,
    pub from: MemberRole,
    pub to: MemberRole,
    /// Ministry role that qualifies a ministry-bearing member
    pub qualifying_ministry_role: MinistryRole,
}

impl PromotionRule {
    /// Trigger that applies under `relation_type`.
    pub fn trigger_for(&self, relation_type: RelationType) -> PromotionTrigger {
        if relation_type.is_ministry_bearing() {
            PromotionTrigger::MinistryRole(self.qualifying_ministry_role)
        } else {
            PromotionTrigger::CandidateFlag
        }
    }

    /// Module the member is edited in once promoted.
    pub fn destination(&self) -> Option<MemberModule> {
        MemberModule::for_role(self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRules {
    rules: Vec<PromotionRule>,
}

impl PromotionRules {
    pub fn new(rules: Vec<PromotionRule>) -> Result<Self, PolicyError> {
        let table = Self { rules };
        table.validate()?;
        Ok(table)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, HierarchyError> {
        let table: Self = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_yaml(&self) -> Result<String, HierarchyError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Rules a module offers.
    pub fn for_module(&self, module: MemberModule) -> impl Iterator<Item = &PromotionRule> {
        self.rules.iter().filter(move |r| r.module == module)
    }

    pub fn rules(&self) -> &[PromotionRule] {
        &self.rules
    }

    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        for rule in &self.rules {
            if rule.from == rule.to {
                return Err(PolicyError::InvalidTable(format!(
                    "rule for {} promotes {} to itself",
                    rule.module, rule.from
                )));
            }
            if rule.destination().is_none() {
                return Err(PolicyError::InvalidTable(format!(
                    "rule for {} promotes to {}, which has no editor",
                    rule.module, rule.to
                )));
            }
        }
        Ok(())
    }
}

impl Default for PromotionRules {
    fn default() -> Self {
        let rule = |module, from, to, qualifying_ministry_role| PromotionRule {
            module,
            from,
            to,
            qualifying_ministry_role,
        };

        Self {
            rules: vec![
                rule(
                    MemberModule::Disciple,
                    MemberRole::Disciple,
                    MemberRole::Preacher,
                    MinistryRole::MinistryPreacher,
                ),
                rule(
                    MemberModule::Preacher,
                    MemberRole::Preacher,
                    MemberRole::Supervisor,
                    MinistryRole::MinistrySupervisor,
                ),
                rule(
                    MemberModule::Supervisor,
                    MemberRole::Supervisor,
                    MemberRole::Copastor,
                    MinistryRole::MinistryCopastor,
                ),
                rule(
                    MemberModule::Copastor,
                    MemberRole::Copastor,
                    MemberRole::Pastor,
                    MinistryRole::MinistryPastor,
                ),
            ],
        }
    }
}
