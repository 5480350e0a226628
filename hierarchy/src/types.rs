//! Core vocabulary for the membership hierarchy.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the browser frontend.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::gate::GateIssue;
use crate::policy::PolicyError;

/// Identifier of any persisted record (church, member, ministry, zone...).
pub type RecordId = String;

/// Which editor is open: the role or structure whose record is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum MemberModule {
    Pastor,
    Copastor,
    Supervisor,
    Preacher,
    Disciple,
    /// Family group structure
    FamilyGroup,
    /// Zone structure
    Zone,
}

impl MemberModule {
    /// All modules, top of the chain of command first.
    pub const ALL: [Self; 7] = [
        Self::Pastor,
        Self::Copastor,
        Self::Supervisor,
        Self::Preacher,
        Self::Disciple,
        Self::FamilyGroup,
        Self::Zone,
    ];

    /// Get string representation for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pastor => "pastor",
            Self::Copastor => "copastor",
            Self::Supervisor => "supervisor",
            Self::Preacher => "preacher",
            Self::Disciple => "disciple",
            Self::FamilyGroup => "family_group",
            Self::Zone => "zone",
        }
    }

    /// Structures carry structure fields and no role set.
    pub fn is_structure(&self) -> bool {
        matches!(self, Self::FamilyGroup | Self::Zone)
    }

    /// The hierarchical role a person module edits.
    pub fn main_role(&self) -> Option<MemberRole> {
        match self {
            Self::Pastor => Some(MemberRole::Pastor),
            Self::Copastor => Some(MemberRole::Copastor),
            Self::Supervisor => Some(MemberRole::Supervisor),
            Self::Preacher => Some(MemberRole::Preacher),
            Self::Disciple => Some(MemberRole::Disciple),
            Self::FamilyGroup | Self::Zone => None,
        }
    }

    /// The person module whose main role is `role`.
    pub fn for_role(role: MemberRole) -> Option<Self> {
        match role {
            MemberRole::Pastor => Some(Self::Pastor),
            MemberRole::Copastor => Some(Self::Copastor),
            MemberRole::Supervisor => Some(Self::Supervisor),
            MemberRole::Preacher => Some(Self::Preacher),
            MemberRole::Disciple => Some(Self::Disciple),
            MemberRole::Treasurer => None,
        }
    }
}

impl std::fmt::Display for MemberModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hierarchical titles a member may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Pastor,
    Copastor,
    Supervisor,
    Preacher,
    Treasurer,
    Disciple,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pastor => "pastor",
            Self::Copastor => "copastor",
            Self::Supervisor => "supervisor",
            Self::Preacher => "preacher",
            Self::Treasurer => "treasurer",
            Self::Disciple => "disciple",
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles held inside a single ministry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum MinistryRole {
    MinistryPastor,
    MinistryCopastor,
    MinistrySupervisor,
    MinistryPreacher,
    MinistryMember,
}

/// Ministry categories offered by a church.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum MinistryCategory {
    Worship,
    Intercession,
    Evangelism,
    Youth,
    Kids,
    Discipleship,
    Missions,
    Counseling,
    Technology,
}

/// How a record is anchored in the org chart.
///
/// Exactly one is active per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Anchored under exactly one upstream leader
    OnlyRelatedHierarchicalCover,
    /// Member of one or more ministries only
    OnlyRelatedMinistries,
    /// Upstream leader and at least one ministry
    RelatedBothMinistriesAndHierarchicalCover,
    /// Supervisor anchored directly under a pastor
    RelatedDirectToPastor,
}

impl RelationType {
    pub const ALL: [Self; 4] = [
        Self::OnlyRelatedHierarchicalCover,
        Self::OnlyRelatedMinistries,
        Self::RelatedBothMinistriesAndHierarchicalCover,
        Self::RelatedDirectToPastor,
    ];

    /// Relation types that carry ministry blocks.
    pub fn is_ministry_bearing(&self) -> bool {
        matches!(
            self,
            Self::OnlyRelatedMinistries | Self::RelatedBothMinistriesAndHierarchicalCover
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnlyRelatedHierarchicalCover => "only_related_hierarchical_cover",
            Self::OnlyRelatedMinistries => "only_related_ministries",
            Self::RelatedBothMinistriesAndHierarchicalCover => {
                "related_both_ministries_and_hierarchical_cover"
            }
            Self::RelatedDirectToPastor => "related_direct_to_pastor",
        }
    }
}

impl Default for RelationType {
    fn default() -> Self {
        Self::OnlyRelatedHierarchicalCover
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream-leader fields a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    TheirChurch,
    TheirPastor,
    TheirPastorOnlyMinistries,
    TheirPastorRelationDirect,
    TheirCopastor,
    TheirSupervisor,
    TheirPreacher,
    TheirFamilyGroup,
    /// Pseudo-field: at least one complete ministry block
    TheirMinistries,
}

impl FieldName {
    /// Whether this field names a single upstream record.
    pub fn is_leader(&self) -> bool {
        !matches!(self, Self::TheirMinistries)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TheirChurch => "theirChurch",
            Self::TheirPastor => "theirPastor",
            Self::TheirPastorOnlyMinistries => "theirPastorOnlyMinistries",
            Self::TheirPastorRelationDirect => "theirPastorRelationDirect",
            Self::TheirCopastor => "theirCopastor",
            Self::TheirSupervisor => "theirSupervisor",
            Self::TheirPreacher => "theirPreacher",
            Self::TheirFamilyGroup => "theirFamilyGroup",
            Self::TheirMinistries => "theirMinistries",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Error types for hierarchy operations.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// Policy table error
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Role may not be switched on from this editor
    #[error("Role {0} is disabled for this editor")]
    RoleDisabled(MemberRole),

    /// Profile kind does not belong to the module
    #[error("Profile does not fit the {0} editor")]
    ProfileMismatch(MemberModule),

    /// Ministry block position does not exist
    #[error("Ministry block {index} out of range ({len} blocks)")]
    BlockOutOfRange { index: usize, len: usize },

    /// Field is not part of the current relation
    #[error("Field {field} is not available for {module} with {relation_type}")]
    FieldNotAvailable {
        field: FieldName,
        module: MemberModule,
        relation_type: RelationType,
    },

    /// Inputs are frozen in the current phase
    #[error("Inputs are disabled while {0}")]
    InputDisabled(&'static str),

    /// Event not valid in the current state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Submission attempted while the gate is not complete
    #[error("Record is incomplete: {0:?}")]
    Incomplete(Vec<GateIssue>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, HierarchyError>;
