//! Collaborator abstraction layer.
//!
//! - Option providers for upstream-leader and ministry selectors
//! - The member store (persistence mutation)
//! - Schema validators
//! - In-memory mocks for testing

pub mod mock;
pub mod traits;

pub use mock::{MockMemberStore, MockOptionProvider, MockValidator};
pub use traits::{
    AcceptAll, MemberStore, OptionFilter, OptionItem, OptionProvider, ProviderError, SaveReceipt,
    SchemaValidator, StoreError,
};
