//! Head/delta reads over the game service's event log.

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use questsync_core::events::{EventSource, Result, SortOrder};
use questsync_core::scopes::scopes_for_event_type;

/// Paginating reader over an [`EventSource`].
///
/// Performs no retries; upstream failures propagate to the caller, which
/// owns retry policy (the loops simply try again next tick).
#[derive(Debug)]
pub struct EventLogReader<E> {
    source: Arc<E>,
    page_size: u32,
}

impl<E> Clone for EventLogReader<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            page_size: self.page_size,
        }
    }
}

impl<E: EventSource> EventLogReader<E> {
    pub fn new(source: Arc<E>, page_size: u32) -> Self {
        Self { source, page_size }
    }

    /// Returns the latest event sequence of a campaign's log, or 0 if the
    /// log is empty.
    pub async fn head_seq(&self, campaign_id: Uuid) -> Result<u64> {
        let page = self
            .source
            .list_events(campaign_id, 0, SortOrder::Descending, 1, None)
            .await?;
        Ok(page.events.first().map(|event| event.seq).unwrap_or(0))
    }

    /// Classifies every event after `after_seq` and returns the union of
    /// the scopes they invalidate, paging forward until the log is
    /// exhausted.
    pub async fn delta_scopes_since(
        &self,
        campaign_id: Uuid,
        after_seq: u64,
    ) -> Result<BTreeSet<String>> {
        let mut scopes = BTreeSet::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .source
                .list_events(
                    campaign_id,
                    after_seq,
                    SortOrder::Ascending,
                    self.page_size,
                    page_token.as_deref(),
                )
                .await?;

            for event in &page.events {
                scopes.extend(scopes_for_event_type(&event.event_type));
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(scopes)
    }
}
