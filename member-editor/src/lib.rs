//! Member Editor - async editing sessions
//!
//! Binds the synchronous hierarchy engine to the outside world:
//! - Trait-based option providers for upstream-leader and ministry selectors
//! - The persistence mutation, with timeout and failure feedback
//! - Schema validation of profile fields
//! - Option lists shared across sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             EditorSession               │
//! │   (MemberForm + async collaborators)    │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┼───────────┐
//!      ▼           ▼           ▼
//! ┌──────────┐ ┌──────────┐ ┌──────────┐
//! │ Option   │ │ Member   │ │ Schema   │
//! │ Provider │ │ Store    │ │ Validator│
//! └──────────┘ └──────────┘ └──────────┘
//! ```

pub mod backend;
pub mod config;
pub mod options;
pub mod session;

// Re-export main types for convenience
pub use backend::traits::{
    MemberStore, OptionFilter, OptionItem, OptionProvider, ProviderError, SaveReceipt,
    SchemaValidator, StoreError,
};
pub use config::EditorConfig;
pub use options::{OptionCache, OptionsState};
pub use session::{EditorSession, SessionError};
