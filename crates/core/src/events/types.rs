use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One event of a campaign's authoritative log, reduced to what coherence
/// needs: its position and its type. Payloads stay upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 1-based position in the campaign's log.
    pub seq: u64,
    /// Dotted event type, e.g. `"session.started"`.
    pub event_type: String,
    pub recorded_at: DateTime<Utc>,
}

/// One page of an event listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<EventRecord>,
    /// Opaque continuation token; `None` means the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Listing direction for [`super::EventSource::list_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Kind of a live update pushed over a subscription stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    /// An event was appended to the log.
    EventAppended,
    /// The event was folded into the service's derived projections. This is
    /// the kind the coherence subsystem subscribes to.
    ProjectionApplied,
}

/// A live update received over a subscription stream. Only the position is
/// interpreted; update content stays upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionUpdate {
    pub seq: u64,
    pub kind: UpdateKind,
}

/// The highest event sequence already reconciled for a campaign.
///
/// Advanced monotonically by the reconciliation loop; never rewound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignEventCursor {
    pub campaign_id: Uuid,
    pub latest_seq: u64,
    pub checked_at: DateTime<Utc>,
}

impl CampaignEventCursor {
    pub fn new(campaign_id: Uuid, latest_seq: u64, checked_at: DateTime<Utc>) -> Self {
        Self {
            campaign_id,
            latest_seq,
            checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrips_through_json() {
        let cursor = CampaignEventCursor::new(Uuid::nil(), 42, Utc::now());
        let json = serde_json::to_string(&cursor).unwrap();
        let back: CampaignEventCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }
}
