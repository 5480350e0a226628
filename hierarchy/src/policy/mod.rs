//! Declarative policy tables.
//!
//! - **Relation**: which upstream fields a (module, relation type) pair shows and requires
//! - **Promotion**: which role upgrades a module offers and what triggers them
//!
//! Tables are plain data with built-in defaults and can be loaded from YAML.

pub mod promotion;
pub mod relation;

pub use promotion::{PromotionRule, PromotionRules, PromotionTrigger};
pub use relation::{FieldSet, RelationPolicy, RelationPolicyEntry};

use crate::types::{MemberModule, RelationType};

/// Errors raised by policy lookups and table validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// No row for this pair; callers must never render an unmapped relation
    #[error("No relation policy for {module} with {relation_type}")]
    Unmapped {
        module: MemberModule,
        relation_type: RelationType,
    },

    /// Table failed validation
    #[error("Invalid policy table: {0}")]
    InvalidTable(String),
}
