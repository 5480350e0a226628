//! Submit gate.
//!
//! Decides from one snapshot of the form whether the save action is enabled
//! and which banner is shown. Recomputed on every change; nothing here is
//! stored between evaluations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::ministry::BlocksReport;
use crate::policy::FieldSet;
use crate::profile::Profile;
use crate::types::{FieldName, MemberModule, MemberRole, RecordId};

/// How duplicated ministry assignments affect the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Warn with a banner, allow saving
    Advisory,
    /// Block saving until resolved
    Strict,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::Advisory
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Incomplete,
    Complete,
    /// A submission was dispatched
    Locked,
}

/// Why a record cannot be saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateIssue {
    MissingProfileFields { fields: Vec<String> },
    NoRoles,
    MissingUpstream { field: FieldName },
    NoCompleteMinistry,
    ValidationErrors,
    DuplicateMinistries { ministry_ids: Vec<RecordId> },
    /// Upstream leader changed and the change is not confirmed yet
    UnconfirmedRelationChange { field: FieldName },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Banner {
    Success,
    Error,
}

/// Everything the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    pub module: MemberModule,
    pub profile: &'a Profile,
    pub roles: &'a BTreeSet<MemberRole>,
    pub fields: &'a FieldSet,
    pub upstream: &'a BTreeMap<FieldName, RecordId>,
    pub blocks: &'a BlocksReport,
    pub has_validation_errors: bool,
    /// Upstream field with a change awaiting confirmation
    pub unconfirmed_change: Option<FieldName>,
    /// Submission dispatched or persisted
    pub locked: bool,
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct GateReport {
    pub state: GateState,
    pub issues: Vec<GateIssue>,
    pub banner: Banner,
    /// Duplicated ministries, reported under either policy
    pub duplicate_ministry_ids: Vec<RecordId>,
}

impl GateReport {
    pub fn is_submit_enabled(&self) -> bool {
        self.state == GateState::Complete
    }

    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn shows_duplicate_warning(&self) -> bool {
        !self.duplicate_ministry_ids.is_empty()
    }
}

/// Evaluate the gate for one snapshot.
pub fn evaluate(input: GateInput<'_>) -> GateReport {
    let issues = collect_issues(&input);

    let state = if input.locked {
        GateState::Locked
    } else if issues.is_empty() {
        GateState::Complete
    } else {
        GateState::Incomplete
    };
    let banner = if issues.is_empty() {
        Banner::Success
    } else {
        Banner::Error
    };

    GateReport {
        state,
        issues,
        banner,
        duplicate_ministry_ids: input.blocks.duplicate_ministry_ids.clone(),
    }
}

fn collect_issues(input: &GateInput<'_>) -> Vec<GateIssue> {
    let mut issues = Vec::new();

    let missing = input.profile.missing_fields();
    if !missing.is_empty() {
        issues.push(GateIssue::MissingProfileFields {
            fields: missing.into_iter().map(str::to_string).collect(),
        });
    }

    if !input.module.is_structure() && input.roles.is_empty() {
        issues.push(GateIssue::NoRoles);
    }

    for field in input.fields.required_leaders() {
        let selected = input
            .upstream
            .get(&field)
            .is_some_and(|id| !id.trim().is_empty());
        if !selected {
            issues.push(GateIssue::MissingUpstream { field });
        }
    }

    if input.fields.requires_ministries() && !input.blocks.has_complete() {
        issues.push(GateIssue::NoCompleteMinistry);
    }

    if let Some(field) = input.unconfirmed_change {
        issues.push(GateIssue::UnconfirmedRelationChange { field });
    }

    if input.has_validation_errors {
        issues.push(GateIssue::ValidationErrors);
    }

    if input.duplicate_policy == DuplicatePolicy::Strict && input.blocks.has_duplicates() {
        issues.push(GateIssue::DuplicateMinistries {
            ministry_ids: input.blocks.duplicate_ministry_ids.clone(),
        });
    }

    issues
}
