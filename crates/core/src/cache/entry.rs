use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cached projection payload plus the metadata the coherence subsystem
/// needs to decide whether it can still be trusted.
///
/// The payload is opaque to this crate: the web tier serializes whatever
/// projection it fetched from the game service and only the read gate in
/// [`CacheEntry::is_usable`] is interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full cache key this entry is stored under (see the `keys` module).
    pub cache_key: String,
    /// Scope this entry belongs to (e.g. `"sessions"`).
    pub scope: String,
    /// Campaign the projection was derived from.
    pub campaign_id: Uuid,
    /// Owner the projection was rendered for, when the scope is per-viewer
    /// (e.g. invites).
    pub owner_id: Option<Uuid>,
    /// Opaque serialized projection.
    pub payload: Vec<u8>,
    /// Event sequence the payload was derived at.
    pub source_seq: u64,
    /// Set by the coherence subsystem when the scope was invalidated.
    pub stale: bool,
    /// When the coherence subsystem last looked at this entry's scope.
    pub checked_at: DateTime<Utc>,
    /// When the payload was last fetched from upstream.
    pub refreshed_at: DateTime<Utc>,
    /// Hard expiry; `None` means the entry never expires on its own.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Creates a fresh entry, as written by the read path after a
    /// successful upstream fetch.
    pub fn new(
        cache_key: String,
        scope: String,
        campaign_id: Uuid,
        owner_id: Option<Uuid>,
        payload: Vec<u8>,
        source_seq: u64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            cache_key,
            scope,
            campaign_id,
            owner_id,
            payload,
            source_seq,
            stale: false,
            checked_at: now,
            refreshed_at: now,
            expires_at,
        }
    }

    /// Returns true if the entry's hard TTL has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// The read gate: a cached payload may be served only while it is
    /// neither stale-marked nor expired. Anything else must be refetched.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.stale && !self.is_expired(now)
    }

    /// Flags the entry as invalidated by the coherence subsystem.
    pub fn mark_stale(&mut self, checked_at: DateTime<Utc>) {
        self.stale = true;
        self.checked_at = checked_at;
    }
}

/// Per-(campaign, scope) invalidation record, written by
/// `CacheStore::mark_scope_stale`.
///
/// Kept separately from cache entries so a scope can be known-stale even
/// before any payload has been cached under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleMark {
    /// Event-log head observed when the scope was invalidated.
    pub head_seq: u64,
    /// When the invalidation was recorded.
    pub checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(stale: bool, expires_at: Option<DateTime<Utc>>) -> CacheEntry {
        let mut e = CacheEntry::new(
            "campaign:00000000-0000-0000-0000-000000000000:sessions".to_string(),
            "sessions".to_string(),
            Uuid::nil(),
            None,
            b"{}".to_vec(),
            7,
            expires_at,
        );
        e.stale = stale;
        e
    }

    #[test]
    fn test_fresh_entry_is_usable() {
        let now = Utc::now();
        let e = entry(false, None);
        assert!(e.is_usable(now));
    }

    #[test]
    fn test_stale_entry_is_not_usable() {
        let now = Utc::now();
        let e = entry(true, None);
        assert!(!e.is_usable(now));
    }

    #[test]
    fn test_expired_entry_is_not_usable() {
        let now = Utc::now();
        let e = entry(false, Some(now - Duration::seconds(1)));
        assert!(e.is_expired(now));
        assert!(!e.is_usable(now));
    }

    #[test]
    fn test_unexpired_ttl_is_usable() {
        let now = Utc::now();
        let e = entry(false, Some(now + Duration::seconds(60)));
        assert!(!e.is_expired(now));
        assert!(e.is_usable(now));
    }

    #[test]
    fn test_mark_stale_sets_flag_and_checked_at() {
        let mut e = entry(false, None);
        let checked_at = Utc::now() + Duration::seconds(5);
        e.mark_stale(checked_at);
        assert!(e.stale);
        assert_eq!(e.checked_at, checked_at);
    }
}
