use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::events::CampaignEventCursor;

use super::{CacheEntry, Result, StaleMark};

/// Trait for cache payload and sync-metadata persistence.
///
/// Implementations must support concurrent calls from the coherence loops
/// and the foreground read path; each call is individually atomic, no
/// further locking discipline is assumed.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Gets a cached entry by key. Expired entries may be dropped lazily
    /// and reported as absent.
    async fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Writes a cached entry under its own `cache_key`.
    async fn put_entry(&self, entry: &CacheEntry) -> Result<()>;

    /// Deletes a cached entry by key.
    async fn delete_entry(&self, key: &str) -> Result<()>;

    /// Lists the campaigns currently tracked for coherence.
    async fn list_tracked_campaigns(&self) -> Result<Vec<Uuid>>;

    /// Gets the reconciled-event cursor for a campaign, if one exists.
    async fn get_cursor(&self, campaign_id: Uuid) -> Result<Option<CampaignEventCursor>>;

    /// Writes the reconciled-event cursor for a campaign.
    async fn put_cursor(&self, cursor: &CampaignEventCursor) -> Result<()>;

    /// Invalidates one scope of a campaign: flags every cached entry under
    /// that scope as stale and records a [`StaleMark`] for the scope.
    async fn mark_scope_stale(
        &self,
        campaign_id: Uuid,
        scope: &str,
        head_seq: u64,
        checked_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Gets the invalidation record for a scope, if one exists. Consulted
    /// by the read path before trusting a cached payload.
    async fn get_stale_mark(&self, campaign_id: Uuid, scope: &str) -> Result<Option<StaleMark>>;
}
