//! In-memory cache store implementation with LRU eviction.
//!
//! Mirrors what a Redis-backed store would do: payloads with lazy TTL
//! expiry, per-(campaign, scope) key tracking so a scope invalidation hits
//! every key under it, and sync metadata (cursors, stale marks) held
//! alongside the payloads.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::num::NonZeroUsize;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::RwLock;
use uuid::Uuid;

use questsync_core::cache::{CacheEntry, CacheStore, Result, StaleMark};
use questsync_core::events::CampaignEventCursor;

/// In-memory cache store with LRU payload eviction.
///
/// Thread-safe via tokio `RwLock`s; each trait call is individually
/// atomic, which is all the coherence loops assume of a store.
#[derive(Debug)]
pub struct MemoryCacheStore {
    /// Payloads keyed by cache key, with LRU eviction.
    entries: RwLock<LruCache<String, CacheEntry>>,
    /// Reconciled-event cursors per campaign.
    cursors: RwLock<HashMap<Uuid, CampaignEventCursor>>,
    /// Campaigns the coherence loops should service.
    tracked: RwLock<BTreeSet<Uuid>>,
    /// Cache keys per (campaign, scope), so a scope invalidation finds
    /// every key under it without scanning the whole store.
    scope_keys: RwLock<HashMap<(Uuid, String), HashSet<String>>>,
    /// Scope invalidation records per (campaign, scope).
    stale_marks: RwLock<HashMap<(Uuid, String), StaleMark>>,
}

impl MemoryCacheStore {
    /// Creates a new in-memory store.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).expect("max_entries must be > 0");
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            cursors: RwLock::new(HashMap::new()),
            tracked: RwLock::new(BTreeSet::new()),
            scope_keys: RwLock::new(HashMap::new()),
            stale_marks: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a campaign to the tracked set without caching anything yet.
    pub async fn track_campaign(&self, campaign_id: Uuid) {
        self.tracked.write().await.insert(campaign_id);
    }

    /// Removes a campaign from the tracked set. Cached payloads and
    /// metadata age out on their own.
    pub async fn untrack_campaign(&self, campaign_id: Uuid) {
        self.tracked.write().await.remove(&campaign_id);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(Utc::now()) => {
                entries.pop(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn put_entry(&self, entry: &CacheEntry) -> Result<()> {
        {
            let mut entries = self.entries.write().await;
            entries.put(entry.cache_key.clone(), entry.clone());
        }
        {
            let mut scope_keys = self.scope_keys.write().await;
            scope_keys
                .entry((entry.campaign_id, entry.scope.clone()))
                .or_default()
                .insert(entry.cache_key.clone());
        }
        // Caching anything for a campaign puts it under coherence tracking.
        self.tracked.write().await.insert(entry.campaign_id);
        Ok(())
    }

    async fn delete_entry(&self, key: &str) -> Result<()> {
        let removed = {
            let mut entries = self.entries.write().await;
            entries.pop(key)
        };
        if let Some(entry) = removed {
            let mut scope_keys = self.scope_keys.write().await;
            if let Some(keys) = scope_keys.get_mut(&(entry.campaign_id, entry.scope.clone())) {
                keys.remove(key);
                if keys.is_empty() {
                    scope_keys.remove(&(entry.campaign_id, entry.scope));
                }
            }
        }
        Ok(())
    }

    async fn list_tracked_campaigns(&self) -> Result<Vec<Uuid>> {
        Ok(self.tracked.read().await.iter().copied().collect())
    }

    async fn get_cursor(&self, campaign_id: Uuid) -> Result<Option<CampaignEventCursor>> {
        Ok(self.cursors.read().await.get(&campaign_id).copied())
    }

    async fn put_cursor(&self, cursor: &CampaignEventCursor) -> Result<()> {
        self.cursors.write().await.insert(cursor.campaign_id, *cursor);
        Ok(())
    }

    async fn mark_scope_stale(
        &self,
        campaign_id: Uuid,
        scope: &str,
        head_seq: u64,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        self.stale_marks.write().await.insert(
            (campaign_id, scope.to_string()),
            StaleMark {
                head_seq,
                checked_at,
            },
        );

        let keys: Vec<String> = {
            let scope_keys = self.scope_keys.read().await;
            scope_keys
                .get(&(campaign_id, scope.to_string()))
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default()
        };
        if !keys.is_empty() {
            let mut entries = self.entries.write().await;
            for key in &keys {
                if let Some(entry) = entries.get_mut(key) {
                    entry.mark_stale(checked_at);
                }
            }
        }

        Ok(())
    }

    async fn get_stale_mark(&self, campaign_id: Uuid, scope: &str) -> Result<Option<StaleMark>> {
        Ok(self
            .stale_marks
            .read()
            .await
            .get(&(campaign_id, scope.to_string()))
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use questsync_core::cache::{owner_scope_key, scope_key};
    use questsync_core::scopes::{SCOPE_INVITES, SCOPE_SESSIONS};

    const TEST_MAX_ENTRIES: usize = 1000;

    fn entry(campaign_id: Uuid, scope: &str, key: String) -> CacheEntry {
        CacheEntry::new(
            key,
            scope.to_string(),
            campaign_id,
            None,
            b"{}".to_vec(),
            1,
            None,
        )
    }

    #[tokio::test]
    async fn test_put_and_get_entry() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        let key = scope_key(campaign_id, SCOPE_SESSIONS);
        let e = entry(campaign_id, SCOPE_SESSIONS, key.clone());

        store.put_entry(&e).await.unwrap();
        let got = store.get_entry(&key).await.unwrap();
        assert_eq!(got, Some(e));
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        let key = scope_key(campaign_id, SCOPE_SESSIONS);
        let mut e = entry(campaign_id, SCOPE_SESSIONS, key.clone());
        e.expires_at = Some(Utc::now() - Duration::seconds(1));

        store.put_entry(&e).await.unwrap();
        assert_eq!(store.get_entry(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_entry_tracks_campaign() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        let key = scope_key(campaign_id, SCOPE_SESSIONS);

        store
            .put_entry(&entry(campaign_id, SCOPE_SESSIONS, key))
            .await
            .unwrap();

        assert_eq!(
            store.list_tracked_campaigns().await.unwrap(),
            vec![campaign_id]
        );
    }

    #[tokio::test]
    async fn test_untrack_campaign() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        store.track_campaign(campaign_id).await;
        store.untrack_campaign(campaign_id).await;
        assert!(store.list_tracked_campaigns().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cursor_roundtrip() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        assert_eq!(store.get_cursor(campaign_id).await.unwrap(), None);

        let cursor = CampaignEventCursor::new(campaign_id, 9, Utc::now());
        store.put_cursor(&cursor).await.unwrap();
        assert_eq!(store.get_cursor(campaign_id).await.unwrap(), Some(cursor));
    }

    #[tokio::test]
    async fn test_mark_scope_stale_flags_every_key_under_scope() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let shared_key = scope_key(campaign_id, SCOPE_INVITES);
        let owner_key = owner_scope_key(campaign_id, SCOPE_INVITES, owner);
        let other_key = scope_key(campaign_id, SCOPE_SESSIONS);

        store
            .put_entry(&entry(campaign_id, SCOPE_INVITES, shared_key.clone()))
            .await
            .unwrap();
        store
            .put_entry(&entry(campaign_id, SCOPE_INVITES, owner_key.clone()))
            .await
            .unwrap();
        store
            .put_entry(&entry(campaign_id, SCOPE_SESSIONS, other_key.clone()))
            .await
            .unwrap();

        let checked_at = Utc::now();
        store
            .mark_scope_stale(campaign_id, SCOPE_INVITES, 5, checked_at)
            .await
            .unwrap();

        assert!(store.get_entry(&shared_key).await.unwrap().unwrap().stale);
        assert!(store.get_entry(&owner_key).await.unwrap().unwrap().stale);
        // Other scopes stay untouched.
        assert!(!store.get_entry(&other_key).await.unwrap().unwrap().stale);

        let mark = store
            .get_stale_mark(campaign_id, SCOPE_INVITES)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mark.head_seq, 5);
        assert_eq!(mark.checked_at, checked_at);
    }

    #[tokio::test]
    async fn test_mark_scope_stale_without_cached_entries_records_mark() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();

        store
            .mark_scope_stale(campaign_id, SCOPE_SESSIONS, 3, Utc::now())
            .await
            .unwrap();

        assert!(store
            .get_stale_mark(campaign_id, SCOPE_SESSIONS)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_entry_stops_scope_tracking() {
        let store = MemoryCacheStore::new(TEST_MAX_ENTRIES);
        let campaign_id = Uuid::new_v4();
        let key = scope_key(campaign_id, SCOPE_SESSIONS);

        store
            .put_entry(&entry(campaign_id, SCOPE_SESSIONS, key.clone()))
            .await
            .unwrap();
        store.delete_entry(&key).await.unwrap();

        assert_eq!(store.get_entry(&key).await.unwrap(), None);
        // A later re-cache must be marked again from scratch.
        store
            .mark_scope_stale(campaign_id, SCOPE_SESSIONS, 2, Utc::now())
            .await
            .unwrap();
        assert_eq!(store.get_entry(&key).await.unwrap(), None);
    }
}
