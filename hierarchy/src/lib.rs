//! Membership Hierarchy Engine
//!
//! Decides how a church member (or a zone / family group) is anchored in the
//! org chart and when their record may be saved:
//!
//! - **Relation policy**: which upstream-leader fields a module shows and requires per relation type
//! - **Ministry blocks**: repeatable ministry affiliations with all-or-nothing persistence
//! - **Submit gate**: completeness, lock state and banner from one snapshot
//! - **Promotion**: forward-only role upgrade that forces a new upstream relation
//! - **Relation change confirmation**: debounced confirmation before re-parenting a record
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       MemberForm                         │
//! │   events ──▶ MemberDraft ──▶ Engine::derive ──▶ FormView │
//! │                                  │                       │
//! │        ┌───────────┬─────────────┼──────────┐            │
//! │        ▼           ▼             ▼          ▼            │
//! │  RelationPolicy  Blocks      SubmitGate  Promotion       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hierarchy::{Engine, FormEvent, MemberDraft, MemberForm, FieldName};
//!
//! let mut form = MemberForm::edit(Arc::new(Engine::with_defaults()), "pre-1", draft)?;
//! form.apply(FormEvent::MarkPromotionCandidate(true), Instant::now())?;
//! form.apply(FormEvent::Promote { direct_to_pastor: false }, Instant::now())?;
//! let view = form.view()?;
//! ```
//!
//! Nothing in this crate performs I/O; time is passed in by the caller.

pub mod config;
pub mod confirmation;
pub mod engine;
pub mod form;
pub mod gate;
pub mod ministry;
pub mod payload;
pub mod policy;
pub mod profile;
pub mod promotion;
pub mod roles;
pub mod types;

// Re-export main types
pub use config::EngineConfig;
pub use confirmation::{ConfirmationState, ConfirmationView, RelationChangeConfirmation};
pub use engine::{Engine, FormSnapshot, FormView, UiFlags};
pub use form::{FormEvent, FormPhase, MemberDraft, MemberForm, SubmitRequest};
pub use gate::{Banner, DuplicatePolicy, GateIssue, GateReport, GateState};
pub use ministry::{BlockPatch, BlocksReport, Ministry, MinistryAssignment, MinistryBlock};
pub use payload::MemberPayload;
pub use policy::{FieldSet, PolicyError, PromotionRule, PromotionRules, RelationPolicy};
pub use profile::{Address, Gender, MaritalStatus, PersonalData, Profile, StructureData};
pub use promotion::{PendingRelation, PromotionState, PromotionWorkflow};
pub use roles::RoleRestrictions;
pub use types::*;
