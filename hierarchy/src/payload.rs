//! The record handed to persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::form::MemberDraft;
use crate::ministry::{self, MinistryAssignment};
use crate::policy::RelationPolicy;
use crate::profile::Profile;
use crate::types::{
    FieldName, MemberModule, MemberRole, RecordId, RecordStatus, RelationType, Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    pub module: MemberModule,
    pub profile: Profile,
    pub roles: Vec<MemberRole>,
    pub relation_type: RelationType,
    pub record_status: RecordStatus,
    /// Only the upstream fields legal for module and relation type
    pub upstream: BTreeMap<FieldName, RecordId>,
    pub their_ministries: Vec<MinistryAssignment>,
}

impl MemberPayload {
    /// Build the payload for a draft.
    ///
    /// Ministries are all-or-nothing: one incomplete block empties the list.
    pub fn build(draft: &MemberDraft, policy: &RelationPolicy) -> Result<Self> {
        let fields = policy.fields_for(draft.module, draft.relation_type)?;

        let upstream = fields
            .visible_leaders()
            .filter_map(|field| {
                draft
                    .upstream
                    .get(&field)
                    .filter(|id| !id.trim().is_empty())
                    .map(|id| (field, id.clone()))
            })
            .collect();

        let their_ministries = if fields.requires_ministries() {
            ministry::assignments(&draft.ministry_blocks)
        } else {
            Vec::new()
        };

        Ok(Self {
            module: draft.module,
            profile: draft.profile.clone(),
            roles: draft.roles.iter().copied().collect(),
            relation_type: draft.relation_type,
            record_status: draft.record_status,
            upstream,
            their_ministries,
        })
    }

    pub fn upstream(&self, field: FieldName) -> Option<&str> {
        self.upstream.get(&field).map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
