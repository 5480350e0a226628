//! In-memory collaborators for testing.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use hierarchy::{FieldName, MemberPayload, Ministry, Profile, RecordId, SubmitRequest};

use super::traits::*;

/// Option provider serving fixed lists.
pub struct MockOptionProvider {
    provider_id: String,
    available: AtomicBool,
    leaders: HashMap<FieldName, Vec<OptionItem>>,
    ministries: HashMap<RecordId, Vec<Ministry>>,
    call_count: AtomicU32,
}

impl MockOptionProvider {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            available: AtomicBool::new(true),
            leaders: HashMap::new(),
            ministries: HashMap::new(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Serve `items` for every filter on `field`.
    pub fn with_leaders(mut self, field: FieldName, items: Vec<OptionItem>) -> Self {
        self.leaders.insert(field, items);
        self
    }

    pub fn with_ministries(
        mut self,
        church_id: impl Into<RecordId>,
        ministries: Vec<Ministry>,
    ) -> Self {
        self.ministries.insert(church_id.into(), ministries);
        self
    }

    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of fetches served or refused.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("Mock provider disabled".to_string()));
        }
        Ok(())
    }
}

impl Default for MockOptionProvider {
    fn default() -> Self {
        Self::new("mock-options")
    }
}

#[async_trait]
impl OptionProvider for MockOptionProvider {
    fn id(&self) -> &str {
        &self.provider_id
    }

    async fn fetch_leaders(&self, filter: OptionFilter) -> Result<Vec<OptionItem>, ProviderError> {
        self.check_available()?;
        let items = self.leaders.get(&filter.field).cloned().unwrap_or_default();
        Ok(items
            .into_iter()
            .filter(|item| filter.exclude_record.as_ref() != Some(&item.id))
            .collect())
    }

    async fn fetch_ministries(&self, church_id: &str) -> Result<Vec<Ministry>, ProviderError> {
        self.check_available()?;
        Ok(self.ministries.get(church_id).cloned().unwrap_or_default())
    }
}

/// Store keeping saved payloads in memory.
pub struct MockMemberStore {
    records: DashMap<RecordId, MemberPayload>,
    available: AtomicBool,
    next_id: AtomicU32,
    call_count: AtomicU32,
}

impl MockMemberStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            available: AtomicBool::new(true),
            next_id: AtomicU32::new(1),
            call_count: AtomicU32::new(0),
        }
    }

    /// Seed an existing record.
    pub fn with_record(self, record_id: impl Into<RecordId>, payload: MemberPayload) -> Self {
        self.records.insert(record_id.into(), payload);
        self
    }

    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn get(&self, record_id: &str) -> Option<MemberPayload> {
        self.records.get(record_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockMemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberStore for MockMemberStore {
    async fn save(&self, request: SubmitRequest) -> Result<SaveReceipt, StoreError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Mock store disabled".to_string()));
        }

        let (record_id, created) = match request.record_id {
            Some(id) if !self.records.contains_key(&id) => return Err(StoreError::NotFound(id)),
            Some(id) => (id, false),
            None => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                (format!("{}-{n}", request.payload.module), true)
            }
        };

        self.records.insert(record_id.clone(), request.payload);
        Ok(SaveReceipt {
            record_id,
            created,
            saved_at: Utc::now(),
        })
    }
}

/// Validator with a switchable answer.
#[derive(Debug, Default)]
pub struct MockValidator {
    has_errors: AtomicBool,
}

impl MockValidator {
    pub fn new(has_errors: bool) -> Self {
        Self {
            has_errors: AtomicBool::new(has_errors),
        }
    }

    pub fn set_has_errors(&self, has_errors: bool) {
        self.has_errors.store(has_errors, Ordering::SeqCst);
    }
}

impl SchemaValidator for MockValidator {
    fn has_errors(&self, _profile: &Profile) -> bool {
        self.has_errors.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierarchy::{MemberDraft, MemberModule, RelationPolicy};

    fn payload() -> MemberPayload {
        MemberPayload::build(
            &MemberDraft::empty(MemberModule::Zone),
            &RelationPolicy::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_provider_excludes_edited_record() {
        let provider = MockOptionProvider::default().with_leaders(
            FieldName::TheirSupervisor,
            vec![OptionItem::new("sup-1", "Ana"), OptionItem::new("sup-2", "Luis")],
        );

        let items = provider
            .fetch_leaders(OptionFilter::new(FieldName::TheirSupervisor).excluding("sup-1"))
            .await
            .unwrap();
        assert_eq!(items, vec![OptionItem::new("sup-2", "Luis")]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_unavailable() {
        let provider = MockOptionProvider::default().with_available(false);
        let result = provider.fetch_ministries("church-1").await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_store_create_then_update() {
        let store = MockMemberStore::new();
        let receipt = store
            .save(SubmitRequest {
                record_id: None,
                payload: payload(),
            })
            .await
            .unwrap();
        assert!(receipt.created);
        assert_eq!(receipt.record_id, "zone-1");

        let receipt = store
            .save(SubmitRequest {
                record_id: Some("zone-1".to_string()),
                payload: payload(),
            })
            .await
            .unwrap();
        assert!(!receipt.created);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_rejects_unknown_record() {
        let store = MockMemberStore::new();
        let result = store
            .save(SubmitRequest {
                record_id: Some("missing".to_string()),
                payload: payload(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
