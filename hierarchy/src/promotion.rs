//! Promotion workflow.
//!
//! ```text
//! NotEligible ──(rule matches)──▶ Eligible ──(promote)──▶ AwaitingNewRelation
//!      ▲                              │                      │        ▲
//!      └────(rule stops matching)─────┘       (leader chosen)▼        │(leader cleared)
//!                                                         Promoted ───┘
//! ```
//!
//! Once promotion begins there is no way back to `Eligible`; the only exit
//! is completing the new relation and saving.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::ministry::MinistryBlock;
use crate::policy::{FieldSet, PromotionRule, PromotionRules, PromotionTrigger, RelationPolicy};
use crate::types::{
    FieldName, HierarchyError, MemberModule, MemberRole, RecordId, RecordStatus, RelationType,
    Result,
};

/// Inputs of the eligibility check.
#[derive(Debug, Clone, Copy)]
pub struct PromotionContext<'a> {
    pub module: MemberModule,
    pub roles: &'a BTreeSet<MemberRole>,
    pub relation_type: RelationType,
    pub blocks: &'a [MinistryBlock],
    pub record_status: RecordStatus,
    /// Form differs from the last persisted state
    pub has_unsaved_changes: bool,
    /// Operator flagged the member for promotion
    pub candidate: bool,
}

/// The relation a promoted member must be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PendingRelation {
    pub rule: PromotionRule,
    pub destination: MemberModule,
    pub relation_type: RelationType,
    pub fields: FieldSet,
}

impl PendingRelation {
    /// Whether every required leader of the new relation is selected.
    pub fn is_satisfied(&self, upstream: &BTreeMap<FieldName, RecordId>) -> bool {
        self.fields
            .required_leaders()
            .all(|f| upstream.get(&f).is_some_and(|id| !id.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PromotionState {
    NotEligible,
    Eligible { rule: PromotionRule },
    AwaitingNewRelation { pending: PendingRelation },
    Promoted { pending: PendingRelation },
}

impl PromotionState {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    /// Promotion began and is not yet persisted.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::AwaitingNewRelation { .. } | Self::Promoted { .. }
        )
    }

    pub fn pending(&self) -> Option<&PendingRelation> {
        match self {
            Self::AwaitingNewRelation { pending } | Self::Promoted { pending } => Some(pending),
            Self::NotEligible | Self::Eligible { .. } => None,
        }
    }
}

impl Default for PromotionState {
    fn default() -> Self {
        Self::NotEligible
    }
}

/// First rule the context qualifies for.
///
/// Never matches an inactive record or one with unsaved changes.
pub fn eligible_rule(ctx: &PromotionContext<'_>, rules: &PromotionRules) -> Option<PromotionRule> {
    if ctx.record_status == RecordStatus::Inactive || ctx.has_unsaved_changes {
        return None;
    }

    rules
        .for_module(ctx.module)
        .find(|rule| {
            if !ctx.roles.contains(&rule.from) || ctx.roles.contains(&rule.to) {
                return false;
            }
            match rule.trigger_for(ctx.relation_type) {
                PromotionTrigger::CandidateFlag => ctx.candidate,
                PromotionTrigger::MinistryRole(role) => ctx
                    .blocks
                    .iter()
                    .any(|b| b.is_complete() && b.has_role(role)),
            }
        })
        .cloned()
}

/// Relation the destination editor uses after promotion.
///
/// The current relation type is kept when the destination supports it;
/// `direct_to_pastor` selects the pastor-direct relation where one exists.
pub fn destination_relation(
    rule: &PromotionRule,
    current: RelationType,
    direct_to_pastor: bool,
    policy: &RelationPolicy,
) -> Result<PendingRelation> {
    let destination = rule.destination().ok_or_else(|| {
        HierarchyError::InvalidTransition(format!("{} has no editor to promote into", rule.to))
    })?;

    let relation_type = if direct_to_pastor {
        if !policy.is_mapped(destination, RelationType::RelatedDirectToPastor) {
            return Err(HierarchyError::InvalidTransition(format!(
                "{destination} cannot relate directly to a pastor"
            )));
        }
        RelationType::RelatedDirectToPastor
    } else if current != RelationType::RelatedDirectToPastor
        && policy.is_mapped(destination, current)
    {
        current
    } else {
        RelationType::OnlyRelatedHierarchicalCover
    };

    Ok(PendingRelation {
        rule: rule.clone(),
        destination,
        relation_type,
        fields: policy.fields_for(destination, relation_type)?,
    })
}

/// Promotion state of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionWorkflow {
    state: PromotionState,
}

impl PromotionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PromotionState {
        &self.state
    }

    /// Re-run the eligibility check. No effect once promotion has begun.
    pub fn refresh(&mut self, ctx: &PromotionContext<'_>, rules: &PromotionRules) {
        if self.state.is_in_progress() {
            return;
        }
        let next = match eligible_rule(ctx, rules) {
            Some(rule) => PromotionState::Eligible { rule },
            None => PromotionState::NotEligible,
        };
        if next != self.state {
            debug!(
                module = %ctx.module,
                eligible = next.is_eligible(),
                "Promotion eligibility changed"
            );
            self.state = next;
        }
    }

    /// Operator pressed promote.
    pub fn begin(
        &mut self,
        current: RelationType,
        direct_to_pastor: bool,
        policy: &RelationPolicy,
    ) -> Result<PendingRelation> {
        let PromotionState::Eligible { rule } = &self.state else {
            return Err(HierarchyError::InvalidTransition(
                "promotion is not available".to_string(),
            ));
        };
        let pending = destination_relation(rule, current, direct_to_pastor, policy)?;

        info!(
            from = %pending.rule.from,
            to = %pending.rule.to,
            relation_type = %pending.relation_type,
            "Promotion started"
        );
        self.state = PromotionState::AwaitingNewRelation {
            pending: pending.clone(),
        };
        Ok(pending)
    }

    /// Switch the pending relation between pastor-direct and the regular one.
    pub fn set_direct_to_pastor(
        &mut self,
        direct_to_pastor: bool,
        fallback: RelationType,
        policy: &RelationPolicy,
    ) -> Result<PendingRelation> {
        let Some(pending) = self.state.pending() else {
            return Err(HierarchyError::InvalidTransition(
                "no promotion in progress".to_string(),
            ));
        };
        let next = destination_relation(&pending.rule, fallback, direct_to_pastor, policy)?;
        self.state = PromotionState::AwaitingNewRelation {
            pending: next.clone(),
        };
        Ok(next)
    }

    /// Move between awaiting and promoted as the new leader is set or cleared.
    pub fn refresh_relation(&mut self, upstream: &BTreeMap<FieldName, RecordId>) {
        let next = match &self.state {
            PromotionState::AwaitingNewRelation { pending } if pending.is_satisfied(upstream) => {
                info!(to = %pending.rule.to, "Promotion relation established");
                PromotionState::Promoted {
                    pending: pending.clone(),
                }
            }
            PromotionState::Promoted { pending } if !pending.is_satisfied(upstream) => {
                PromotionState::AwaitingNewRelation {
                    pending: pending.clone(),
                }
            }
            _ => return,
        };
        self.state = next;
    }

    /// The promoted record was persisted.
    pub fn complete(&mut self) {
        if self.state.is_in_progress() {
            self.state = PromotionState::NotEligible;
        }
    }
}
