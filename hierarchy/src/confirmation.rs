//! Confirmation of upstream-leader changes.
//!
//! Moving a record under a different leader moves all of its hierarchical
//! descendants with it, so a change away from the loaded leader must be
//! confirmed explicitly. The dialog opens only after the change has been
//! stable for the debounce delay; reverting to the loaded value first
//! cancels it.
//!
//! Time is passed in by the caller.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{FieldName, HierarchyError, RecordId, Result};

/// Default debounce before the dialog opens.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState {
    Confirmed,
    Unconfirmed {
        candidate: RecordId,
        since: Instant,
        dialog_open: bool,
    },
}

/// Serializable view for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationView {
    pub field: FieldName,
    pub last_known: Option<RecordId>,
    pub candidate: Option<RecordId>,
    pub dialog_open: bool,
}

#[derive(Debug, Clone)]
pub struct RelationChangeConfirmation {
    field: FieldName,
    last_known: Option<RecordId>,
    debounce: Duration,
    state: ConfirmationState,
}

impl RelationChangeConfirmation {
    /// Start tracking `field`, loaded with `loaded`.
    pub fn new(field: FieldName, loaded: Option<RecordId>, debounce: Duration) -> Self {
        Self {
            field,
            last_known: loaded,
            debounce,
            state: ConfirmationState::Confirmed,
        }
    }

    pub fn field(&self) -> FieldName {
        self.field
    }

    pub fn last_known(&self) -> Option<&RecordId> {
        self.last_known.as_ref()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == ConfirmationState::Confirmed
    }

    pub fn is_dialog_open(&self) -> bool {
        matches!(
            self.state,
            ConfirmationState::Unconfirmed {
                dialog_open: true,
                ..
            }
        )
    }

    pub fn view(&self) -> ConfirmationView {
        let (candidate, dialog_open) = match &self.state {
            ConfirmationState::Confirmed => (None, false),
            ConfirmationState::Unconfirmed {
                candidate,
                dialog_open,
                ..
            } => (Some(candidate.clone()), *dialog_open),
        };
        ConfirmationView {
            field: self.field,
            last_known: self.last_known.clone(),
            candidate,
            dialog_open,
        }
    }

    /// Record the field's current value.
    ///
    /// A cleared field is a transient state and never asks for confirmation.
    pub fn observe(&mut self, current: Option<&RecordId>, now: Instant) {
        let Some(current) = current.filter(|id| Some(*id) != self.last_known.as_ref()) else {
            if !self.is_confirmed() {
                debug!(field = %self.field, "Pending relation change cancelled");
            }
            self.state = ConfirmationState::Confirmed;
            return;
        };

        if let ConfirmationState::Unconfirmed { candidate, .. } = &self.state {
            if candidate == current {
                return;
            }
        }
        debug!(field = %self.field, candidate = %current, "Relation change pending confirmation");
        self.state = ConfirmationState::Unconfirmed {
            candidate: current.clone(),
            since: now,
            dialog_open: false,
        };
    }

    /// Open the dialog once the pending change outlived the debounce.
    ///
    /// Returns whether the dialog is open.
    pub fn poll(&mut self, now: Instant) -> bool {
        if let ConfirmationState::Unconfirmed {
            since, dialog_open, ..
        } = &mut self.state
        {
            if !*dialog_open && now.saturating_duration_since(*since) >= self.debounce {
                *dialog_open = true;
            }
        }
        self.is_dialog_open()
    }

    /// Accept the pending change; the candidate becomes the known value.
    pub fn confirm(&mut self) -> Result<RecordId> {
        let ConfirmationState::Unconfirmed {
            candidate,
            dialog_open: true,
            ..
        } = &self.state
        else {
            return Err(HierarchyError::InvalidTransition(
                "no relation change awaiting confirmation".to_string(),
            ));
        };
        let candidate = candidate.clone();
        self.last_known = Some(candidate.clone());
        self.state = ConfirmationState::Confirmed;
        Ok(candidate)
    }

    /// Reject the pending change; returns the value the field reverts to.
    pub fn dismiss(&mut self) -> Result<Option<RecordId>> {
        if self.is_confirmed() {
            return Err(HierarchyError::InvalidTransition(
                "no relation change awaiting confirmation".to_string(),
            ));
        }
        self.state = ConfirmationState::Confirmed;
        Ok(self.last_known.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RelationChangeConfirmation {
        RelationChangeConfirmation::new(
            FieldName::TheirSupervisor,
            Some("sup-1".to_string()),
            DEFAULT_DEBOUNCE,
        )
    }

    fn id(value: &str) -> RecordId {
        value.to_string()
    }

    #[test]
    fn test_dialog_opens_after_debounce() {
        let start = Instant::now();
        let mut confirmation = tracker();

        confirmation.observe(Some(&id("sup-2")), start);
        assert!(!confirmation.is_confirmed());
        assert!(!confirmation.poll(start + Duration::from_millis(100)));
        assert!(confirmation.poll(start + DEFAULT_DEBOUNCE));
    }

    #[test]
    fn test_confirm_updates_last_known() {
        let start = Instant::now();
        let mut confirmation = tracker();
        confirmation.observe(Some(&id("sup-2")), start);
        confirmation.poll(start + DEFAULT_DEBOUNCE);

        assert_eq!(confirmation.confirm().unwrap(), "sup-2");
        assert_eq!(confirmation.last_known().map(String::as_str), Some("sup-2"));
        assert!(!confirmation.is_dialog_open());
    }

    #[test]
    fn test_confirm_before_dialog_is_rejected() {
        let mut confirmation = tracker();
        confirmation.observe(Some(&id("sup-2")), Instant::now());
        assert!(confirmation.confirm().is_err());
    }

    #[test]
    fn test_dismiss_reverts() {
        let start = Instant::now();
        let mut confirmation = tracker();
        confirmation.observe(Some(&id("sup-2")), start);
        confirmation.poll(start + DEFAULT_DEBOUNCE);

        assert_eq!(confirmation.dismiss().unwrap(), Some(id("sup-1")));
        assert!(confirmation.is_confirmed());
        assert_eq!(confirmation.last_known().map(String::as_str), Some("sup-1"));
    }

    #[test]
    fn test_revert_cancels_pending() {
        let start = Instant::now();
        let mut confirmation = tracker();

        confirmation.observe(Some(&id("sup-2")), start);
        confirmation.observe(Some(&id("sup-1")), start + Duration::from_millis(50));

        assert!(confirmation.is_confirmed());
        assert!(!confirmation.poll(start + Duration::from_secs(5)));
        assert_eq!(confirmation.last_known().map(String::as_str), Some("sup-1"));
    }

    #[test]
    fn test_revert_closes_open_dialog() {
        let start = Instant::now();
        let mut confirmation = tracker();
        confirmation.observe(Some(&id("sup-2")), start);
        assert!(confirmation.poll(start + DEFAULT_DEBOUNCE));

        confirmation.observe(Some(&id("sup-1")), start + Duration::from_secs(1));
        assert!(!confirmation.is_dialog_open());
    }

    #[test]
    fn test_new_candidate_restarts_debounce() {
        let start = Instant::now();
        let mut confirmation = tracker();
        confirmation.observe(Some(&id("sup-2")), start);
        confirmation.observe(Some(&id("sup-3")), start + Duration::from_millis(200));

        assert!(!confirmation.poll(start + DEFAULT_DEBOUNCE));
        assert!(confirmation.poll(start + Duration::from_millis(500)));
        assert_eq!(confirmation.view().candidate, Some(id("sup-3")));
    }

    #[test]
    fn test_cleared_field_does_not_prompt() {
        let start = Instant::now();
        let mut confirmation = tracker();
        confirmation.observe(None, start);
        assert!(!confirmation.poll(start + Duration::from_secs(1)));
    }
}
