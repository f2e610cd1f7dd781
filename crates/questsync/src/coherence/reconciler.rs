//! Periodic reconciliation loop.
//!
//! Every tick: list tracked campaigns, window them for fairness, and for
//! each selected campaign compare the persisted cursor against the event
//! log head. A campaign that fell behind gets its invalidated scopes
//! marked stale and its cursor advanced to the head.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use questsync_core::cache::CacheStore;
use questsync_core::events::{CampaignEventCursor, EventSource};
use questsync_core::scopes::resolve_stale_scopes;

use crate::config::Config;

use super::{EventLogReader, RoundRobinWindow};

/// The stale-marking half of the coherence subsystem.
pub struct Reconciler<S, E> {
    store: Arc<S>,
    reader: EventLogReader<E>,
    window: RoundRobinWindow,
    interval: Duration,
    max_per_tick: usize,
}

impl<S, E> Reconciler<S, E>
where
    S: CacheStore,
    E: EventSource,
{
    pub fn new(store: Arc<S>, source: Arc<E>, config: &Config) -> Self {
        Self {
            store,
            reader: EventLogReader::new(source, config.delta_page_size),
            window: RoundRobinWindow::new(),
            interval: config.sync_interval(),
            max_per_tick: config.reconcile_max_per_tick,
        }
    }

    /// Runs the loop until `shutdown` fires. The first tick happens
    /// immediately, then once per interval.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            interval_seconds = self.interval.as_secs(),
            max_per_tick = self.max_per_tick,
            "Reconciliation loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.tick().await {
                        // Whatever went wrong is retried next tick; staleness
                        // just lingers one extra cycle.
                        tracing::warn!(error = %err, "Reconciliation tick aborted");
                    }
                }
            }
        }

        tracing::info!("Reconciliation loop stopped");
    }

    /// One reconciliation pass over the fairness-selected campaigns.
    ///
    /// The first failing campaign aborts the pass; the rotation window has
    /// already advanced, so skipped campaigns come back around on a later
    /// tick.
    pub async fn tick(&self) -> anyhow::Result<()> {
        let ids = self
            .store
            .list_tracked_campaigns()
            .await
            .context("listing tracked campaigns")?;
        let selected = self.window.select(&ids, self.max_per_tick);
        tracing::debug!(
            tracked = ids.len(),
            selected = selected.len(),
            "Reconciling campaigns"
        );

        for campaign_id in selected {
            self.reconcile_campaign(campaign_id)
                .await
                .with_context(|| format!("reconciling campaign {campaign_id}"))?;
        }

        Ok(())
    }

    async fn reconcile_campaign(&self, campaign_id: Uuid) -> anyhow::Result<()> {
        let head_seq = self
            .reader
            .head_seq(campaign_id)
            .await
            .context("reading log head")?;
        let cursor = self
            .store
            .get_cursor(campaign_id)
            .await
            .context("reading cursor")?;
        let latest_seq = cursor.map(|c| c.latest_seq).unwrap_or(0);

        let delta_scopes = match cursor {
            Some(c) if head_seq > c.latest_seq => Some(
                self.reader
                    .delta_scopes_since(campaign_id, c.latest_seq)
                    .await
                    .context("scanning event delta")?,
            ),
            _ => None,
        };

        let stale_scopes =
            resolve_stale_scopes(cursor.is_some(), latest_seq, head_seq, delta_scopes.as_ref());
        let checked_at = Utc::now();

        // Marks land before the cursor moves: a crash in between leaves the
        // cache over-marked, never under-marked.
        for scope in &stale_scopes {
            self.store
                .mark_scope_stale(campaign_id, scope, head_seq, checked_at)
                .await
                .with_context(|| format!("marking scope {scope} stale"))?;
            tracing::debug!(campaign_id = %campaign_id, scope = %scope, head_seq, "Scope marked stale");
        }

        // Always persisted, even when nothing went stale, so repeated ticks
        // against a static head are no-ops.
        self.store
            .put_cursor(&CampaignEventCursor::new(campaign_id, head_seq, checked_at))
            .await
            .context("writing cursor")?;

        if !stale_scopes.is_empty() {
            tracing::info!(
                campaign_id = %campaign_id,
                scopes = stale_scopes.len(),
                latest_seq,
                head_seq,
                "Campaign cache invalidated"
            );
        }

        Ok(())
    }
}
