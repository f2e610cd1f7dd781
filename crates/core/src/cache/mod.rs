mod entry;
mod error;
mod keys;
mod traits;

pub use entry::{CacheEntry, StaleMark};
pub use error::{CacheError, Result};
pub use keys::{
    extract_campaign_id_from_key, extract_scope_from_key, owner_scope_key, scope_key,
    scope_pattern,
};
pub use traits::CacheStore;
