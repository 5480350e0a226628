//! One member editor.
//!
//! `MemberForm` owns the draft of a single record and applies operator events
//! to it. Every derived flag comes from `Engine::derive` over a snapshot of the
//! form; the form itself stores only the draft, the submission status, the
//! promotion workflow and the relation-change tracker.
//!
//! ```text
//! Editing ──submit──▶ Submitting ──ok──▶ Saved ──reopen──▶ Editing
//!    ▲                    │                 │
//!    └──────edit────── Failed ◀──err──┘     └──promote──▶ AwaitingPromotionRelation ◀─▶ Promoted
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::confirmation::RelationChangeConfirmation;
use crate::engine::{Engine, FormSnapshot, FormView};
use crate::gate::GateState;
use crate::ministry::{self, BlockPatch, Ministry, MinistryBlock};
use crate::payload::MemberPayload;
use crate::policy::{FieldSet, RelationPolicy};
use crate::profile::Profile;
use crate::promotion::{PendingRelation, PromotionContext, PromotionState, PromotionWorkflow};
use crate::roles::{toggle_member_role, RoleRestrictions};
use crate::types::{
    FieldName, HierarchyError, MemberModule, MemberRole, MinistryRole, RecordId, RecordStatus,
    RelationType, Result,
};

/// Editable state of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub module: MemberModule,
    pub profile: Profile,
    pub roles: BTreeSet<MemberRole>,
    pub relation_type: RelationType,
    pub upstream: BTreeMap<FieldName, RecordId>,
    pub ministry_blocks: Vec<MinistryBlock>,
    pub record_status: RecordStatus,
}

impl MemberDraft {
    /// A fresh draft: the module's main role, hierarchical cover, one empty block.
    pub fn new(module: MemberModule, profile: Profile) -> Self {
        Self {
            module,
            profile,
            roles: module.main_role().into_iter().collect(),
            relation_type: RelationType::default(),
            upstream: BTreeMap::new(),
            ministry_blocks: ministry::initial_blocks(),
            record_status: RecordStatus::default(),
        }
    }

    /// A draft with an empty profile of the module's kind.
    pub fn empty(module: MemberModule) -> Self {
        Self::new(module, Profile::empty_for(module))
    }

    pub fn with_relation_type(mut self, relation_type: RelationType) -> Self {
        self.relation_type = relation_type;
        self
    }

    pub fn with_upstream(mut self, field: FieldName, id: impl Into<RecordId>) -> Self {
        self.upstream.insert(field, id.into());
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = MemberRole>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn with_ministry_blocks(mut self, blocks: Vec<MinistryBlock>) -> Self {
        self.ministry_blocks = blocks;
        self
    }

    pub fn with_record_status(mut self, record_status: RecordStatus) -> Self {
        self.record_status = record_status;
        self
    }

    /// Whether both drafts persist to the same record.
    ///
    /// Blank leader ids and UI-only block state are ignored.
    pub fn same_record(&self, other: &Self) -> bool {
        self.module == other.module
            && self.profile == other.profile
            && self.roles == other.roles
            && self.relation_type == other.relation_type
            && self.record_status == other.record_status
            && self.selected_upstream().eq(other.selected_upstream())
            && self.ministry_blocks.len() == other.ministry_blocks.len()
            && self
                .ministry_blocks
                .iter()
                .zip(&other.ministry_blocks)
                .all(|(a, b)| a.same_selection(b))
    }

    /// Switch the relation type, dropping whatever the new one does not show.
    pub fn switch_relation_type(
        &mut self,
        relation_type: RelationType,
        policy: &RelationPolicy,
    ) -> Result<()> {
        let fields = policy.fields_for(self.module, relation_type)?;
        self.adopt_relation(relation_type, &fields);
        Ok(())
    }

    fn adopt_relation(&mut self, relation_type: RelationType, fields: &FieldSet) {
        if self.relation_type.is_ministry_bearing() && relation_type != self.relation_type {
            self.ministry_blocks = ministry::initial_blocks();
        }
        self.relation_type = relation_type;
        self.upstream.retain(|field, _| fields.is_visible(*field));
    }

    fn selected_upstream(&self) -> impl Iterator<Item = (&FieldName, &RecordId)> {
        self.upstream.iter().filter(|(_, id)| !id.trim().is_empty())
    }
}

/// Operator input to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    SetProfile(Profile),
    /// Outcome of the schema validator
    SetValidationErrors(bool),
    ToggleRole(MemberRole),
    SetRelationType(RelationType),
    /// `None` or a blank id clears the field
    SelectUpstream {
        field: FieldName,
        id: Option<RecordId>,
    },
    AddBlock,
    RemoveBlock(usize),
    UpdateBlock {
        index: usize,
        patch: BlockPatch,
    },
    ToggleMinistryRole {
        index: usize,
        role: MinistryRole,
    },
    SelectChurch {
        index: usize,
        church_id: RecordId,
        ministries: Vec<Ministry>,
    },
    SetRecordStatus(RecordStatus),
    MarkPromotionCandidate(bool),
    Promote {
        direct_to_pastor: bool,
    },
    SetDirectToPastor(bool),
    ConfirmRelationChange,
    DismissRelationChange,
}

impl FormEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetProfile(_) => "set_profile",
            Self::SetValidationErrors(_) => "set_validation_errors",
            Self::ToggleRole(_) => "toggle_role",
            Self::SetRelationType(_) => "set_relation_type",
            Self::SelectUpstream { .. } => "select_upstream",
            Self::AddBlock => "add_block",
            Self::RemoveBlock(_) => "remove_block",
            Self::UpdateBlock { .. } => "update_block",
            Self::ToggleMinistryRole { .. } => "toggle_ministry_role",
            Self::SelectChurch { .. } => "select_church",
            Self::SetRecordStatus(_) => "set_record_status",
            Self::MarkPromotionCandidate(_) => "mark_promotion_candidate",
            Self::Promote { .. } => "promote",
            Self::SetDirectToPastor(_) => "set_direct_to_pastor",
            Self::ConfirmRelationChange => "confirm_relation_change",
            Self::DismissRelationChange => "dismiss_relation_change",
        }
    }
}

/// The single state every UI flag is projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Editing,
    Submitting,
    Saved,
    AwaitingPromotionRelation,
    Promoted,
    Failed,
}

impl FormPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Saved => "saved",
            Self::AwaitingPromotionRelation => "awaiting_promotion_relation",
            Self::Promoted => "promoted",
            Self::Failed => "failed",
        }
    }

    /// Personal data, roles, relation type and record status are frozen.
    pub fn is_input_disabled(&self) -> bool {
        !matches!(self, Self::Editing | Self::Failed)
    }

    pub fn is_relation_select_disabled(&self) -> bool {
        matches!(self, Self::Submitting | Self::Saved)
    }

    pub fn is_direct_pastor_checkbox_disabled(&self) -> bool {
        !matches!(self, Self::AwaitingPromotionRelation | Self::Promoted)
    }

    /// A submission was dispatched or persisted.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Submitting | Self::Saved)
    }

    pub fn allows_promotion(&self) -> bool {
        matches!(self, Self::Editing | Self::Saved)
    }
}

impl std::fmt::Display for FormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the persistence call receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// `None` creates a new record
    pub record_id: Option<RecordId>,
    pub payload: MemberPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Submission {
    Idle,
    Pending,
    Saved,
    Failed(String),
}

/// Editor for one record.
#[derive(Debug, Clone)]
pub struct MemberForm {
    engine: Arc<Engine>,
    record_id: Option<RecordId>,
    draft: MemberDraft,
    /// Last persisted state; `None` until a new record is first saved
    baseline: Option<MemberDraft>,
    restrictions: RoleRestrictions,
    has_validation_errors: bool,
    candidate: bool,
    submission: Submission,
    promotion: PromotionWorkflow,
    relation_before_promotion: Option<RelationType>,
    confirmation: Option<RelationChangeConfirmation>,
}

impl MemberForm {
    /// Form for a record that does not exist yet.
    pub fn create(engine: Arc<Engine>, draft: MemberDraft) -> Result<Self> {
        Self::open(engine, None, draft)
    }

    /// Form for a persisted record, loaded as `draft`.
    pub fn edit(
        engine: Arc<Engine>,
        record_id: impl Into<RecordId>,
        draft: MemberDraft,
    ) -> Result<Self> {
        Self::open(engine, Some(record_id.into()), draft)
    }

    fn open(engine: Arc<Engine>, record_id: Option<RecordId>, draft: MemberDraft) -> Result<Self> {
        if !draft.profile.fits(draft.module) {
            return Err(HierarchyError::ProfileMismatch(draft.module));
        }
        engine
            .relation_policy()
            .fields_for(draft.module, draft.relation_type)?;

        let (baseline, confirmation) = match &record_id {
            Some(_) => (Some(draft.clone()), tracker_for(&engine, &draft, &draft)),
            None => (None, None),
        };

        debug!(
            module = %draft.module,
            record_id = ?record_id,
            relation_type = %draft.relation_type,
            "Member form opened"
        );

        Ok(Self {
            restrictions: RoleRestrictions::for_module(draft.module),
            engine,
            record_id,
            draft,
            baseline,
            has_validation_errors: false,
            candidate: false,
            submission: Submission::Idle,
            promotion: PromotionWorkflow::new(),
            relation_before_promotion: None,
            confirmation,
        })
    }

    /// Replace the module's default role restrictions.
    pub fn with_restrictions(mut self, restrictions: RoleRestrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    pub fn draft(&self) -> &MemberDraft {
        &self.draft
    }

    pub fn restrictions(&self) -> &RoleRestrictions {
        &self.restrictions
    }

    pub fn promotion_state(&self) -> &PromotionState {
        self.promotion.state()
    }

    pub fn confirmation(&self) -> Option<&RelationChangeConfirmation> {
        self.confirmation.as_ref()
    }

    /// Reason of the last failed submission.
    pub fn last_error(&self) -> Option<&str> {
        match &self.submission {
            Submission::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn phase(&self) -> FormPhase {
        match (&self.submission, self.promotion.state()) {
            (Submission::Pending, _) => FormPhase::Submitting,
            (Submission::Saved, _) => FormPhase::Saved,
            (_, PromotionState::AwaitingNewRelation { .. }) => FormPhase::AwaitingPromotionRelation,
            (_, PromotionState::Promoted { .. }) => FormPhase::Promoted,
            (Submission::Failed(_), _) => FormPhase::Failed,
            (Submission::Idle, _) => FormPhase::Editing,
        }
    }

    /// Draft differs from the last persisted state.
    pub fn has_unsaved_changes(&self) -> bool {
        self.baseline
            .as_ref()
            .map_or(true, |baseline| !baseline.same_record(&self.draft))
    }

    /// Fields of the current relation.
    pub fn fields(&self) -> Result<FieldSet> {
        Ok(self
            .engine
            .relation_policy()
            .fields_for(self.draft.module, self.draft.relation_type)?)
    }

    pub fn view(&self) -> Result<FormView> {
        self.engine.derive(&FormSnapshot {
            draft: &self.draft,
            phase: self.phase(),
            has_validation_errors: self.has_validation_errors,
            has_unsaved_changes: self.has_unsaved_changes(),
            candidate: self.candidate,
            promotion: self.promotion.state(),
            confirmation: self.confirmation.as_ref(),
        })
    }

    /// Apply one operator event at time `now`.
    pub fn apply(&mut self, event: FormEvent, now: Instant) -> Result<()> {
        debug!(module = %self.draft.module, event = event.name(), "Form event");

        match event {
            FormEvent::SetProfile(profile) => {
                self.ensure_inputs_enabled()?;
                if !profile.fits(self.draft.module) {
                    return Err(HierarchyError::ProfileMismatch(self.draft.module));
                }
                self.draft.profile = profile;
            }
            FormEvent::SetValidationErrors(has_errors) => {
                self.set_validation_errors(has_errors);
            }
            FormEvent::ToggleRole(role) => {
                self.ensure_inputs_enabled()?;
                self.draft.roles = toggle_member_role(&self.draft.roles, role, &self.restrictions)?;
            }
            FormEvent::SetRelationType(relation_type) => {
                self.ensure_inputs_enabled()?;
                let previous = self.draft.relation_type;
                self.draft
                    .switch_relation_type(relation_type, self.engine.relation_policy())?;
                if relation_type != previous {
                    self.retrack();
                }
            }
            FormEvent::SelectUpstream { field, id } => {
                self.select_upstream(field, id)?;
            }
            FormEvent::AddBlock => {
                self.ensure_blocks_editable()?;
                self.draft.ministry_blocks = ministry::add_block(&self.draft.ministry_blocks);
            }
            FormEvent::RemoveBlock(index) => {
                self.ensure_blocks_editable()?;
                self.draft.ministry_blocks =
                    ministry::remove_block(&self.draft.ministry_blocks, index)?;
            }
            FormEvent::UpdateBlock { index, patch } => {
                self.ensure_blocks_editable()?;
                self.draft.ministry_blocks =
                    ministry::update_block(&self.draft.ministry_blocks, index, patch)?;
            }
            FormEvent::ToggleMinistryRole { index, role } => {
                self.ensure_blocks_editable()?;
                self.draft.ministry_blocks =
                    ministry::toggle_role(&self.draft.ministry_blocks, index, role)?;
            }
            FormEvent::SelectChurch {
                index,
                church_id,
                ministries,
            } => {
                self.ensure_blocks_editable()?;
                self.draft.ministry_blocks = ministry::select_church(
                    &self.draft.ministry_blocks,
                    index,
                    church_id,
                    ministries,
                )?;
            }
            FormEvent::SetRecordStatus(record_status) => {
                self.ensure_inputs_enabled()?;
                self.draft.record_status = record_status;
            }
            FormEvent::MarkPromotionCandidate(candidate) => {
                if self.promotion.state().is_in_progress() {
                    return Err(HierarchyError::InvalidTransition(
                        "promotion already in progress".to_string(),
                    ));
                }
                self.candidate = candidate;
            }
            FormEvent::Promote { direct_to_pastor } => {
                self.promote(direct_to_pastor)?;
            }
            FormEvent::SetDirectToPastor(direct_to_pastor) => {
                self.set_direct_to_pastor(direct_to_pastor)?;
            }
            FormEvent::ConfirmRelationChange => {
                let confirmation = self.confirmation.as_mut().ok_or_else(no_pending_change)?;
                let id = confirmation.confirm()?;
                info!(field = %confirmation.field(), leader = %id, "Relation change confirmed");
            }
            FormEvent::DismissRelationChange => {
                let confirmation = self.confirmation.as_mut().ok_or_else(no_pending_change)?;
                let field = confirmation.field();
                match confirmation.dismiss()? {
                    Some(id) => {
                        self.draft.upstream.insert(field, id);
                    }
                    None => {
                        self.draft.upstream.remove(&field);
                    }
                }
                debug!(field = %field, "Relation change dismissed");
            }
        }

        self.settle(now);
        Ok(())
    }

    /// Record the schema validator's verdict on the profile.
    pub fn set_validation_errors(&mut self, has_errors: bool) {
        self.has_validation_errors = has_errors;
    }

    /// Advance time-driven state. Returns whether the confirmation dialog is open.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.confirmation
            .as_mut()
            .is_some_and(|confirmation| confirmation.poll(now))
    }

    /// Dispatch a submission; inputs freeze until it resolves.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest> {
        let view = self.view()?;
        match view.gate.state {
            GateState::Complete => {}
            GateState::Locked => {
                return Err(HierarchyError::InvalidTransition(format!(
                    "cannot submit while {}",
                    view.phase
                )))
            }
            GateState::Incomplete => return Err(HierarchyError::Incomplete(view.gate.issues)),
        }

        let payload = MemberPayload::build(&self.draft, self.engine.relation_policy())?;
        self.submission = Submission::Pending;

        info!(
            module = %self.draft.module,
            record_id = ?self.record_id,
            relation_type = %self.draft.relation_type,
            "Submission dispatched"
        );
        Ok(SubmitRequest {
            record_id: self.record_id.clone(),
            payload,
        })
    }

    /// The persistence call succeeded; the draft becomes the baseline.
    pub fn submit_succeeded(&mut self, record_id: impl Into<RecordId>) -> Result<()> {
        self.ensure_pending()?;
        let record_id = record_id.into();

        if self.promotion.state().is_in_progress() {
            info!(record_id = %record_id, module = %self.draft.module, "Promotion persisted");
            self.promotion.complete();
            self.relation_before_promotion = None;
        }

        self.record_id = Some(record_id);
        self.baseline = Some(self.draft.clone());
        self.submission = Submission::Saved;
        self.candidate = false;
        self.confirmation = tracker_for(&self.engine, &self.draft, &self.draft);

        info!(record_id = ?self.record_id, "Submission saved");
        Ok(())
    }

    /// The persistence call failed; inputs are re-enabled for a retry.
    pub fn submit_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.ensure_pending()?;
        let reason = reason.into();
        warn!(record_id = ?self.record_id, reason = %reason, "Submission failed");
        self.submission = Submission::Failed(reason);
        Ok(())
    }

    /// Leave the saved state to edit again.
    pub fn reopen(&mut self) -> Result<()> {
        if self.submission != Submission::Saved {
            return Err(HierarchyError::InvalidTransition(format!(
                "cannot reopen while {}",
                self.phase()
            )));
        }
        self.submission = Submission::Idle;
        Ok(())
    }

    fn select_upstream(&mut self, field: FieldName, id: Option<RecordId>) -> Result<()> {
        let phase = self.phase();
        if phase.is_relation_select_disabled() {
            return Err(HierarchyError::InputDisabled(phase.as_str()));
        }
        let fields = self.fields()?;
        if !field.is_leader() || !fields.is_visible(field) {
            return Err(HierarchyError::FieldNotAvailable {
                field,
                module: self.draft.module,
                relation_type: self.draft.relation_type,
            });
        }

        match id.filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                self.draft.upstream.insert(field, id);
            }
            None => {
                self.draft.upstream.remove(&field);
            }
        }
        Ok(())
    }

    fn promote(&mut self, direct_to_pastor: bool) -> Result<()> {
        let phase = self.phase();
        if !phase.allows_promotion() {
            return Err(HierarchyError::InvalidTransition(format!(
                "cannot promote while {phase}"
            )));
        }

        let has_unsaved_changes = self.has_unsaved_changes();
        let ctx = PromotionContext {
            module: self.draft.module,
            roles: &self.draft.roles,
            relation_type: self.draft.relation_type,
            blocks: &self.draft.ministry_blocks,
            record_status: self.draft.record_status,
            has_unsaved_changes,
            candidate: self.candidate,
        };
        self.promotion.refresh(&ctx, self.engine.promotion_rules());

        let current = self.draft.relation_type;
        let pending =
            self.promotion
                .begin(current, direct_to_pastor, self.engine.relation_policy())?;

        self.relation_before_promotion = Some(current);
        self.submission = Submission::Idle;
        self.candidate = false;
        self.confirmation = None;
        self.apply_pending(&pending);
        Ok(())
    }

    fn set_direct_to_pastor(&mut self, direct_to_pastor: bool) -> Result<()> {
        let phase = self.phase();
        if phase.is_direct_pastor_checkbox_disabled() {
            return Err(HierarchyError::InputDisabled(phase.as_str()));
        }
        let fallback = self.relation_before_promotion.unwrap_or_default();
        let pending = self.promotion.set_direct_to_pastor(
            direct_to_pastor,
            fallback,
            self.engine.relation_policy(),
        )?;
        self.apply_pending(&pending);
        Ok(())
    }

    /// Move the draft into the destination editor of a promotion.
    fn apply_pending(&mut self, pending: &PendingRelation) {
        self.draft.roles.insert(pending.rule.to);
        self.draft.module = pending.destination;
        self.restrictions = RoleRestrictions::for_module(pending.destination);
        self.draft
            .adopt_relation(pending.relation_type, &pending.fields);
    }

    /// Watch the leader of the current relation against the persisted record.
    fn retrack(&mut self) {
        self.confirmation = self
            .baseline
            .as_ref()
            .and_then(|baseline| tracker_for(&self.engine, &self.draft, baseline));
    }

    fn settle(&mut self, now: Instant) {
        if let Some(confirmation) = self.confirmation.as_mut() {
            let current = self.draft.upstream.get(&confirmation.field());
            confirmation.observe(current, now);
            confirmation.poll(now);
        }
        self.promotion.refresh_relation(&self.draft.upstream);
    }

    fn ensure_inputs_enabled(&self) -> Result<()> {
        let phase = self.phase();
        if phase.is_input_disabled() {
            return Err(HierarchyError::InputDisabled(phase.as_str()));
        }
        Ok(())
    }

    /// Blocks stay editable during promotion when the new relation needs ministries.
    fn ensure_blocks_editable(&self) -> Result<()> {
        let phase = self.phase();
        let promoting = matches!(
            phase,
            FormPhase::AwaitingPromotionRelation | FormPhase::Promoted
        );
        if phase.is_input_disabled() && !promoting {
            return Err(HierarchyError::InputDisabled(phase.as_str()));
        }
        if !self.draft.relation_type.is_ministry_bearing() {
            return Err(HierarchyError::FieldNotAvailable {
                field: FieldName::TheirMinistries,
                module: self.draft.module,
                relation_type: self.draft.relation_type,
            });
        }
        Ok(())
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.submission != Submission::Pending {
            return Err(HierarchyError::InvalidTransition(format!(
                "no submission pending while {}",
                self.phase()
            )));
        }
        Ok(())
    }
}

/// Tracker on the leader field `draft`'s relation requires, seeded from `baseline`.
fn tracker_for(
    engine: &Engine,
    draft: &MemberDraft,
    baseline: &MemberDraft,
) -> Option<RelationChangeConfirmation> {
    let field = match engine
        .relation_policy()
        .upstream_field_for(draft.module, draft.relation_type)
    {
        Ok(field) => field?,
        Err(e) => {
            warn!(module = %draft.module, error = %e, "No relation change tracking");
            return None;
        }
    };
    let loaded = baseline
        .upstream
        .get(&field)
        .filter(|id| !id.trim().is_empty())
        .cloned();
    Some(RelationChangeConfirmation::new(
        field,
        loaded,
        engine.confirmation_debounce(),
    ))
}

fn no_pending_change() -> HierarchyError {
    HierarchyError::InvalidTransition("no relation change awaiting confirmation".to_string())
}
