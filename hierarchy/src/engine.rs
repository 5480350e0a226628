//! The assignment engine.
//!
//! Holds the policy tables and derives every gate and flag of a form from a
//! single snapshot, in a fixed order:
//!
//! relation policy → ministry blocks → submit gate → promotion eligibility

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::config::EngineConfig;
use crate::confirmation::{ConfirmationView, RelationChangeConfirmation};
use crate::form::{FormPhase, MemberDraft};
use crate::gate::{self, Banner, DuplicatePolicy, GateInput, GateReport};
use crate::ministry::BlocksReport;
use crate::policy::{FieldSet, PromotionRules, RelationPolicy};
use crate::promotion::{eligible_rule, PromotionContext, PromotionState};
use crate::types::{RelationType, Result};

/// Everything derivation reads.
#[derive(Debug, Clone, Copy)]
pub struct FormSnapshot<'a> {
    pub draft: &'a MemberDraft,
    pub phase: FormPhase,
    pub has_validation_errors: bool,
    pub has_unsaved_changes: bool,
    pub candidate: bool,
    pub promotion: &'a PromotionState,
    pub confirmation: Option<&'a RelationChangeConfirmation>,
}

/// Boolean projections of the phase and the derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UiFlags {
    pub is_input_disabled: bool,
    pub is_submit_button_disabled: bool,
    pub is_message_error_disabled: bool,
    pub is_message_promote_disabled: bool,
    pub is_relation_select_disabled: bool,
    pub is_direct_pastor_checkbox_disabled: bool,
    pub is_duplicate_warning_visible: bool,
    pub is_confirmation_dialog_open: bool,
}

/// Derived state of a form, rendered by the frontend as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub phase: FormPhase,
    pub relation_types: Vec<RelationType>,
    pub fields: FieldSet,
    pub blocks: BlocksReport,
    pub gate: GateReport,
    pub promotion: PromotionState,
    pub confirmation: Option<ConfirmationView>,
    pub flags: UiFlags,
}

/// Policy tables plus engine settings.
#[derive(Debug, Clone)]
pub struct Engine {
    relation_policy: RelationPolicy,
    promotion_rules: PromotionRules,
    duplicate_policy: DuplicatePolicy,
    confirmation_debounce: Duration,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            confirmation_debounce: config.confirmation_debounce(),
            relation_policy: config.relation_policy,
            promotion_rules: config.promotion_rules,
            duplicate_policy: config.duplicate_policy,
        }
    }

    /// Engine with the built-in tables.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn relation_policy(&self) -> &RelationPolicy {
        &self.relation_policy
    }

    pub fn promotion_rules(&self) -> &PromotionRules {
        &self.promotion_rules
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    pub fn confirmation_debounce(&self) -> Duration {
        self.confirmation_debounce
    }

    /// Derive the full view of one snapshot.
    pub fn derive(&self, snapshot: &FormSnapshot<'_>) -> Result<FormView> {
        let draft = snapshot.draft;
        let phase = snapshot.phase;

        let fields = self
            .relation_policy
            .fields_for(draft.module, draft.relation_type)?;
        let relation_types = self.relation_policy.relation_types_for(draft.module);

        let blocks = if draft.relation_type.is_ministry_bearing() {
            BlocksReport::of(&draft.ministry_blocks)
        } else {
            BlocksReport::default()
        };

        let confirmation = snapshot.confirmation;
        let gate = gate::evaluate(GateInput {
            module: draft.module,
            profile: &draft.profile,
            roles: &draft.roles,
            fields: &fields,
            upstream: &draft.upstream,
            blocks: &blocks,
            has_validation_errors: snapshot.has_validation_errors,
            unconfirmed_change: confirmation
                .filter(|c| !c.is_confirmed())
                .map(RelationChangeConfirmation::field),
            locked: phase.is_locked(),
            duplicate_policy: self.duplicate_policy,
        });

        let promotion = if snapshot.promotion.is_in_progress() {
            snapshot.promotion.clone()
        } else {
            let ctx = PromotionContext {
                module: draft.module,
                roles: &draft.roles,
                relation_type: draft.relation_type,
                blocks: &draft.ministry_blocks,
                record_status: draft.record_status,
                has_unsaved_changes: snapshot.has_unsaved_changes,
                candidate: snapshot.candidate,
            };
            match eligible_rule(&ctx, &self.promotion_rules) {
                Some(rule) => PromotionState::Eligible { rule },
                None => PromotionState::NotEligible,
            }
        };

        let flags = UiFlags {
            is_input_disabled: phase.is_input_disabled(),
            is_submit_button_disabled: !gate.is_submit_enabled(),
            is_message_error_disabled: gate.banner != Banner::Error,
            is_message_promote_disabled: !(promotion.is_eligible() && phase.allows_promotion()),
            is_relation_select_disabled: phase.is_relation_select_disabled(),
            is_direct_pastor_checkbox_disabled: phase.is_direct_pastor_checkbox_disabled(),
            is_duplicate_warning_visible: gate.shows_duplicate_warning(),
            is_confirmation_dialog_open: confirmation.is_some_and(|c| c.is_dialog_open()),
        };

        Ok(FormView {
            phase,
            relation_types,
            fields,
            blocks,
            gate,
            promotion,
            confirmation: confirmation.map(RelationChangeConfirmation::view),
            flags,
        })
    }
}
