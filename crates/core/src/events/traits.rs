use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use uuid::Uuid;

use super::{EventPage, ProjectionUpdate, Result, SortOrder, UpdateKind};

/// A long-lived stream of live updates for one campaign. May terminate at
/// any time; the consumer owns reconnection.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<ProjectionUpdate>> + Send>>;

/// Client boundary to the game service's authoritative event log.
///
/// Implementations perform no retries of their own; callers decide retry
/// policy per failure.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Lists events of a campaign's log.
    ///
    /// `after_seq` filters to events with `seq > after_seq` (pass 0 for the
    /// whole log). A head read is `Descending` with `page_size` 1; a delta
    /// scan is `Ascending`, followed via `next_page_token` until exhausted.
    async fn list_events(
        &self,
        campaign_id: Uuid,
        after_seq: u64,
        order: SortOrder,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<EventPage>;

    /// Opens a live update stream for a campaign, filtered to `kinds`,
    /// starting after `after_seq`.
    async fn subscribe(
        &self,
        campaign_id: Uuid,
        after_seq: u64,
        kinds: &[UpdateKind],
    ) -> Result<UpdateStream>;
}
