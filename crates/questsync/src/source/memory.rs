//! In-memory event source implementation.
//!
//! An append-only per-campaign log with broadcast fan-out of live updates.
//! Used by the daemon's default wiring and by tests; real deployments
//! implement [`EventSource`] over the game service's RPC surface.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use questsync_core::events::{
    EventPage, EventRecord, EventSource, EventSourceError, ProjectionUpdate, Result, SortOrder,
    UpdateKind, UpdateStream,
};

/// Capacity of the per-campaign update fan-out channel. Subscribers that
/// fall this far behind get a stream error and reconnect.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// In-memory append-only event log with live update fan-out.
#[derive(Debug)]
pub struct MemoryEventSource {
    /// Per-campaign event logs; seq is the 1-based index into the log.
    logs: RwLock<HashMap<Uuid, Vec<EventRecord>>>,
    /// Per-campaign live update channels, created lazily on first use.
    channels: RwLock<HashMap<Uuid, broadcast::Sender<ProjectionUpdate>>>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Appends an event to a campaign's log and fans out live updates to
    /// subscribers. Returns the sequence assigned to the event.
    pub async fn append(&self, campaign_id: Uuid, event_type: &str) -> u64 {
        let seq = {
            let mut logs = self.logs.write().await;
            let log = logs.entry(campaign_id).or_default();
            let seq = log.len() as u64 + 1;
            log.push(EventRecord {
                seq,
                event_type: event_type.to_string(),
                recorded_at: Utc::now(),
            });
            seq
        };

        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(&campaign_id) {
            // Receivers may be gone; a send error just means nobody listens.
            let _ = tx.send(ProjectionUpdate {
                seq,
                kind: UpdateKind::EventAppended,
            });
            let _ = tx.send(ProjectionUpdate {
                seq,
                kind: UpdateKind::ProjectionApplied,
            });
        }

        seq
    }
}

impl Default for MemoryEventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn list_events(
        &self,
        campaign_id: Uuid,
        after_seq: u64,
        order: SortOrder,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<EventPage> {
        if page_size == 0 {
            return Err(EventSourceError::InvalidPage(
                "page size must be positive".to_string(),
            ));
        }
        // Page tokens are offsets into the filtered, ordered listing.
        let offset: usize = match page_token {
            Some(token) => token
                .parse()
                .map_err(|_| EventSourceError::InvalidPage(format!("bad page token: {token}")))?,
            None => 0,
        };

        let logs = self.logs.read().await;
        let mut events: Vec<EventRecord> = logs
            .get(&campaign_id)
            .map(|log| {
                log.iter()
                    .filter(|event| event.seq > after_seq)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if order == SortOrder::Descending {
            events.reverse();
        }

        let end = (offset.saturating_add(page_size as usize)).min(events.len());
        let page = events.get(offset..end).unwrap_or_default().to_vec();
        let next_page_token = (end < events.len()).then(|| end.to_string());

        Ok(EventPage {
            events: page,
            next_page_token,
        })
    }

    async fn subscribe(
        &self,
        campaign_id: Uuid,
        after_seq: u64,
        kinds: &[UpdateKind],
    ) -> Result<UpdateStream> {
        let mut rx = {
            let mut channels = self.channels.write().await;
            channels
                .entry(campaign_id)
                .or_insert_with(|| broadcast::channel(UPDATE_CHANNEL_CAPACITY).0)
                .subscribe()
        };
        let kinds = kinds.to_vec();

        let stream = async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(update) => {
                        if update.seq > after_seq && kinds.contains(&update.kind) {
                            yield Ok(update);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        yield Err(EventSourceError::StreamClosed(format!(
                            "receiver lagged by {skipped} updates"
                        )));
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
