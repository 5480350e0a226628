//! Option lists for the upstream and ministry selectors.
//!
//! Lists are shared between sessions through `OptionCache`; a failed fetch
//! leaves the selector disabled instead of failing the form.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use hierarchy::{Ministry, RecordId};

use crate::backend::{OptionFilter, OptionItem};

/// State of one selector's option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OptionsState {
    Loading,
    Ready { items: Vec<OptionItem> },
    /// Fetch failed; the selector is disabled
    Unavailable { reason: String },
}

impl OptionsState {
    pub fn is_disabled(&self) -> bool {
        !matches!(self, Self::Ready { .. })
    }

    pub fn items(&self) -> &[OptionItem] {
        match self {
            Self::Ready { items } => items,
            Self::Loading | Self::Unavailable { .. } => &[],
        }
    }
}

/// Option lists shared across sessions, expiring after a TTL.
pub struct OptionCache {
    leaders: DashMap<OptionFilter, (Vec<OptionItem>, Instant)>,
    ministries: DashMap<RecordId, (Vec<Ministry>, Instant)>,
    ttl: Duration,
}

impl OptionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            leaders: DashMap::new(),
            ministries: DashMap::new(),
            ttl,
        }
    }

    pub fn leaders(&self, filter: &OptionFilter) -> Option<Vec<OptionItem>> {
        let entry = self.leaders.get(filter)?;
        let (items, stored_at) = entry.value();
        if stored_at.elapsed() < self.ttl {
            Some(items.clone())
        } else {
            None
        }
    }

    pub fn put_leaders(&self, filter: OptionFilter, items: Vec<OptionItem>) {
        self.leaders.insert(filter, (items, Instant::now()));
    }

    pub fn ministries(&self, church_id: &str) -> Option<Vec<Ministry>> {
        let entry = self.ministries.get(church_id)?;
        let (ministries, stored_at) = entry.value();
        if stored_at.elapsed() < self.ttl {
            Some(ministries.clone())
        } else {
            None
        }
    }

    pub fn put_ministries(&self, church_id: impl Into<RecordId>, ministries: Vec<Ministry>) {
        self.ministries
            .insert(church_id.into(), (ministries, Instant::now()));
    }

    /// Drop every leader list. Saving a record changes who is assignable.
    pub fn invalidate_leaders(&self) {
        let dropped = self.leaders.len();
        self.leaders.clear();
        debug!(dropped, "Leader option lists invalidated");
    }

    /// Remove expired entries.
    pub fn cleanup(&self) {
        let ttl = self.ttl;
        self.leaders.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
        self.ministries
            .retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.leaders.len() + self.ministries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OptionCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierarchy::FieldName;

    #[test]
    fn test_unavailable_disables_selector() {
        let state = OptionsState::Unavailable {
            reason: "offline".to_string(),
        };
        assert!(state.is_disabled());
        assert!(state.items().is_empty());
        assert!(OptionsState::Loading.is_disabled());

        let ready = OptionsState::Ready {
            items: vec![OptionItem::new("sup-1", "Ana")],
        };
        assert!(!ready.is_disabled());
        assert_eq!(ready.items().len(), 1);
    }

    #[test]
    fn test_state_json_shape() {
        let json = serde_json::to_value(OptionsState::Ready {
            items: vec![OptionItem::new("sup-1", "Ana")],
        })
        .unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["items"][0]["label"], "Ana");
    }

    #[test]
    fn test_cache_hit_and_invalidate() {
        let cache = OptionCache::default();
        let filter = OptionFilter::new(FieldName::TheirCopastor);
        assert!(cache.leaders(&filter).is_none());

        cache.put_leaders(filter.clone(), vec![OptionItem::new("cop-9", "Rosa")]);
        assert_eq!(cache.leaders(&filter).unwrap()[0].id, "cop-9");

        cache.invalidate_leaders();
        assert!(cache.leaders(&filter).is_none());
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let cache = OptionCache::new(Duration::ZERO);
        cache.put_ministries("church-1", Vec::new());
        assert!(cache.ministries("church-1").is_none());

        cache.cleanup();
        assert!(cache.is_empty());
    }
}
