//! The cache coherence subsystem: keeps cached campaign projections from
//! silently going stale as the authoritative event log advances.
//!
//! Two loops share the tracked-campaign list, each with its own fairness
//! window: the [`Reconciler`] marks scopes stale on a fixed interval, and
//! the [`SubscriptionManager`] holds live update streams for a rotating
//! subset of campaigns.

mod fairness;
mod reader;
mod reconciler;
mod subscriptions;

pub use fairness::RoundRobinWindow;
pub use reader::EventLogReader;
pub use reconciler::Reconciler;
pub use subscriptions::SubscriptionManager;
