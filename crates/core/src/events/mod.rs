mod error;
mod traits;
mod types;

pub use error::{EventSourceError, Result};
pub use traits::{EventSource, UpdateStream};
pub use types::{
    CampaignEventCursor, EventPage, EventRecord, ProjectionUpdate, SortOrder, UpdateKind,
};
