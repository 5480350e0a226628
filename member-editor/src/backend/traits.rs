//! Collaborator traits.
//!
//! The session talks to the outside world only through these: option lists
//! for the upstream selectors, the persistence mutation, and the schema
//! validator for personal fields.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use hierarchy::{FieldName, Ministry, Profile, RecordId, SubmitRequest};

/// Error types for option-list fetches.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Provider is not reachable
    #[error("Option provider unavailable: {0}")]
    Unavailable(String),

    /// Request failed
    #[error("Option request failed: {0}")]
    RequestFailed(String),
}

/// Error types for the persistence mutation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Store is not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store refused the record
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// Record to update does not exist
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// No answer within the configured timeout.
    ///
    /// The store may still have committed the save.
    #[error("Save timed out after {0}ms")]
    Timeout(u64),
}

/// Which leaders an upstream selector offers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct OptionFilter {
    pub field: FieldName,
    /// The record being edited, never offered as its own leader
    pub exclude_record: Option<RecordId>,
}

impl OptionFilter {
    pub fn new(field: FieldName) -> Self {
        Self {
            field,
            exclude_record: None,
        }
    }

    pub fn excluding(mut self, record_id: impl Into<RecordId>) -> Self {
        self.exclude_record = Some(record_id.into());
        self
    }
}

/// One entry of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct OptionItem {
    pub id: RecordId,
    pub label: String,
}

impl OptionItem {
    pub fn new(id: impl Into<RecordId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Acknowledgement of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub record_id: RecordId,
    /// Whether the save created the record
    pub created: bool,
    pub saved_at: DateTime<Utc>,
}

/// Source of upstream-leader and ministry option lists.
#[async_trait]
pub trait OptionProvider: Send + Sync {
    /// Provider identifier for logs.
    fn id(&self) -> &str;

    /// Leaders selectable for one upstream field.
    async fn fetch_leaders(&self, filter: OptionFilter) -> Result<Vec<OptionItem>, ProviderError>;

    /// Ministries offered by a church.
    async fn fetch_ministries(&self, church_id: &str) -> Result<Vec<Ministry>, ProviderError>;
}

/// The persistence mutation.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Create (`record_id` is `None`) or update a record.
    async fn save(&self, request: SubmitRequest) -> Result<SaveReceipt, StoreError>;
}

/// Field-level validation of the profile, opaque to the gate.
pub trait SchemaValidator: Send + Sync {
    fn has_errors(&self, profile: &Profile) -> bool;
}

/// Validator that accepts every profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SchemaValidator for AcceptAll {
    fn has_errors(&self, _profile: &Profile) -> bool {
        false
    }
}
