//! EditorSession - one member form bound to its collaborators.
//!
//! The form itself is synchronous; the session owns the two asynchronous
//! boundaries: option-list fetches and the save mutation. Both are observed
//! only as pending / succeeded / failed and fed back into the form.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hierarchy::{FieldName, FormEvent, FormView, HierarchyError, MemberForm, RecordId};

use crate::backend::{
    AcceptAll, MemberStore, OptionFilter, OptionProvider, SaveReceipt, SchemaValidator, StoreError,
};
use crate::config::EditorConfig;
use crate::options::{OptionCache, OptionsState};

/// Error types for sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Rejected by the form
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Save mutation failed
    #[error("Save failed: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// One editing session.
pub struct EditorSession {
    /// Session ID for log correlation
    session_id: String,
    config: EditorConfig,
    form: MemberForm,
    provider: Arc<dyn OptionProvider>,
    store: Arc<dyn MemberStore>,
    validator: Arc<dyn SchemaValidator>,
    /// Option lists, possibly shared with other sessions
    cache: Arc<OptionCache>,
    /// Selector state per upstream field of the current relation
    options: BTreeMap<FieldName, OptionsState>,
}

impl EditorSession {
    /// Create a session with default configuration.
    pub fn new(
        form: MemberForm,
        provider: Arc<dyn OptionProvider>,
        store: Arc<dyn MemberStore>,
    ) -> Self {
        let config = EditorConfig::default();
        let session_id = Uuid::new_v4().to_string();
        debug!(
            session_id = %session_id,
            module = %form.draft().module,
            record_id = ?form.record_id(),
            "Editor session opened"
        );

        let mut session = Self {
            session_id,
            cache: Arc::new(OptionCache::new(config.option_cache_ttl())),
            config,
            form,
            provider,
            store,
            validator: Arc::new(AcceptAll),
            options: BTreeMap::new(),
        };
        session.revalidate();
        session
    }

    /// Create with configuration. Replaces a private option cache.
    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.cache = Arc::new(OptionCache::new(config.option_cache_ttl()));
        self.config = config;
        self
    }

    /// Share an option cache with other sessions.
    pub fn with_cache(mut self, cache: Arc<OptionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Validate the loaded profile with `validator` and every edit after it.
    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self.revalidate();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn form(&self) -> &MemberForm {
        &self.form
    }

    /// Selector state for `field`; `None` until options are loaded.
    pub fn options(&self, field: FieldName) -> Option<&OptionsState> {
        self.options.get(&field)
    }

    pub fn view(&self) -> Result<FormView> {
        Ok(self.form.view()?)
    }

    /// Apply an event now. Profile edits are re-validated.
    pub fn apply(&mut self, event: FormEvent) -> Result<FormView> {
        let now = Instant::now();
        let revalidate = matches!(event, FormEvent::SetProfile(_));

        self.form.apply(event, now)?;

        if revalidate {
            self.revalidate();
        }
        self.view()
    }

    fn revalidate(&mut self) {
        let has_errors = self.validator.has_errors(&self.form.draft().profile);
        if has_errors {
            debug!(session_id = %self.session_id, "Profile fails schema validation");
        }
        self.form.set_validation_errors(has_errors);
    }

    /// Advance debounce timers. Returns whether the confirmation dialog is open.
    pub fn tick(&mut self) -> bool {
        self.form.tick(Instant::now())
    }

    /// Load the leader lists for every selector of the current relation.
    ///
    /// Cached lists are reused; the rest are fetched concurrently. A failed
    /// fetch disables its selector and is not an error.
    pub async fn load_options(&mut self) -> Result<()> {
        let fields = self.form.fields()?;
        self.options.retain(|field, _| fields.is_visible(*field));

        let mut pending = Vec::new();
        for field in fields.visible_leaders() {
            let filter = self.filter_for(field);
            match self.cache.leaders(&filter) {
                Some(items) => {
                    self.options.insert(field, OptionsState::Ready { items });
                }
                None => {
                    self.options.insert(field, OptionsState::Loading);
                    pending.push(filter);
                }
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        debug!(
            session_id = %self.session_id,
            provider = self.provider.id(),
            count = pending.len(),
            "Fetching option lists"
        );

        let provider = &self.provider;
        let results = join_all(pending.into_iter().map(|filter| async move {
            let result = provider.fetch_leaders(filter.clone()).await;
            (filter, result)
        }))
        .await;

        for (filter, result) in results {
            let state = match result {
                Ok(items) => {
                    self.cache.put_leaders(filter.clone(), items.clone());
                    OptionsState::Ready { items }
                }
                Err(e) => {
                    warn!(
                        session_id = %self.session_id,
                        field = %filter.field,
                        error = %e,
                        "Option list unavailable"
                    );
                    OptionsState::Unavailable {
                        reason: e.to_string(),
                    }
                }
            };
            self.options.insert(filter.field, state);
        }
        Ok(())
    }

    /// Set the church of a ministry block and load its ministries.
    pub async fn select_church(
        &mut self,
        index: usize,
        church_id: impl Into<RecordId>,
    ) -> Result<FormView> {
        let church_id = church_id.into();
        let ministries = match self.cache.ministries(&church_id) {
            Some(ministries) => ministries,
            None => match self.provider.fetch_ministries(&church_id).await {
                Ok(ministries) => {
                    self.cache
                        .put_ministries(church_id.clone(), ministries.clone());
                    ministries
                }
                Err(e) => {
                    warn!(
                        session_id = %self.session_id,
                        church_id = %church_id,
                        error = %e,
                        "Ministry list unavailable"
                    );
                    Vec::new()
                }
            },
        };

        self.apply(FormEvent::SelectChurch {
            index,
            church_id,
            ministries,
        })
    }

    /// Submit the form through the store.
    ///
    /// The form stays `Submitting` until the store answers or the timeout
    /// hits. A failure re-enables the form; nothing is retried.
    ///
    /// On timeout the in-flight save is dropped, not cancelled at the store.
    /// A store that commits late leaves the form `Failed` over a persisted
    /// record. Resubmitting an existing record overwrites it with the same
    /// payload; resubmitting a new one may create a second record.
    pub async fn submit(&mut self) -> Result<SaveReceipt> {
        let request = self.form.begin_submit()?;

        let save = self.store.save(request);
        let outcome = match tokio::time::timeout(self.config.save_timeout(), save).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.config.save_timeout_ms)),
        };

        match outcome {
            Ok(receipt) => {
                self.form.submit_succeeded(receipt.record_id.clone())?;
                self.cache.invalidate_leaders();
                info!(
                    session_id = %self.session_id,
                    record_id = %receipt.record_id,
                    created = receipt.created,
                    "Record saved"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "Save failed");
                self.form.submit_failed(e.to_string())?;
                Err(e.into())
            }
        }
    }

    /// Leave the saved state to edit again.
    pub fn reopen(&mut self) -> Result<()> {
        Ok(self.form.reopen()?)
    }

    fn filter_for(&self, field: FieldName) -> OptionFilter {
        let filter = OptionFilter::new(field);
        match self.form.record_id() {
            Some(record_id) => filter.excluding(record_id.clone()),
            None => filter,
        }
    }
}
