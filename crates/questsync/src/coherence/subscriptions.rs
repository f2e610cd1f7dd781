//! Live subscription manager.
//!
//! Holds at most one streaming subscription per campaign in the currently
//! fairness-selected set. Each subscription runs in its own worker task
//! with a cancellable retry loop; the manager reconciles the worker
//! population against the tracked-campaign list every tick and joins every
//! worker before its own shutdown completes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use questsync_core::cache::CacheStore;
use questsync_core::events::{EventSource, UpdateKind};

use crate::config::Config;

use super::{EventLogReader, RoundRobinWindow};

/// Runtime handle for one campaign's subscription worker. Never persisted;
/// the population is rebuilt from the tracked-campaign list every tick.
struct SubscriptionHandle {
    cancel: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// The live-update half of the coherence subsystem.
pub struct SubscriptionManager<S, E> {
    store: Arc<S>,
    source: Arc<E>,
    reader: EventLogReader<E>,
    window: RoundRobinWindow,
    interval: Duration,
    max_per_tick: usize,
    retry_delay: Duration,
    /// Touched only by the reconciliation tick and shutdown, never by the
    /// workers themselves.
    active: Mutex<HashMap<Uuid, SubscriptionHandle>>,
}

impl<S, E> SubscriptionManager<S, E>
where
    S: CacheStore + 'static,
    E: EventSource + 'static,
{
    pub fn new(store: Arc<S>, source: Arc<E>, config: &Config) -> Self {
        Self {
            store,
            reader: EventLogReader::new(Arc::clone(&source), config.delta_page_size),
            source,
            window: RoundRobinWindow::new(),
            interval: config.sync_interval(),
            max_per_tick: config.subscribe_max_per_tick,
            retry_delay: config.stream_retry(),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Runs the manager until `shutdown` fires, then joins every worker.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            interval_seconds = self.interval.as_secs(),
            max_per_tick = self.max_per_tick,
            "Subscription manager started"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => self.reconcile_subscriptions().await,
            }
        }

        self.shutdown_all().await;
        tracing::info!("Subscription manager stopped");
    }

    /// Number of live subscription workers.
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Aligns the worker population with the currently selected campaigns:
    /// spawns workers that are newly selected and cancels workers whose
    /// campaign dropped out.
    pub async fn reconcile_subscriptions(&self) {
        let ids = match self.store.list_tracked_campaigns().await {
            Ok(ids) => ids,
            Err(err) => {
                // Existing workers keep running; we just try again next tick.
                tracing::warn!(error = %err, "Skipping subscription reconciliation tick");
                return;
            }
        };
        let selected: HashSet<Uuid> = self
            .window
            .select(&ids, self.max_per_tick)
            .into_iter()
            .collect();

        let dropped: Vec<(Uuid, SubscriptionHandle)> = {
            let mut active = self.active.lock().unwrap();
            let gone: Vec<Uuid> = active
                .keys()
                .filter(|id| !selected.contains(id))
                .copied()
                .collect();
            gone.into_iter()
                .filter_map(|id| active.remove(&id).map(|handle| (id, handle)))
                .collect()
        };
        for (campaign_id, handle) in dropped {
            let _ = handle.cancel.send(true);
            if let Err(err) = handle.join.await {
                tracing::warn!(campaign_id = %campaign_id, error = %err, "Subscription worker panicked");
            }
            tracing::debug!(campaign_id = %campaign_id, "Subscription stopped");
        }

        for campaign_id in selected {
            let mut active = self.active.lock().unwrap();
            if active.contains_key(&campaign_id) {
                continue;
            }
            let (cancel_tx, cancel_rx) = watch::channel(false);
            let join = tokio::spawn(run_subscription_worker(
                Arc::clone(&self.store),
                Arc::clone(&self.source),
                self.reader.clone(),
                campaign_id,
                self.retry_delay,
                cancel_rx,
            ));
            active.insert(
                campaign_id,
                SubscriptionHandle {
                    cancel: cancel_tx,
                    join,
                },
            );
            tracing::debug!(campaign_id = %campaign_id, "Subscription started");
        }
    }

    /// Cancels every worker and waits for all of them to exit.
    pub async fn shutdown_all(&self) {
        let handles: Vec<(Uuid, SubscriptionHandle)> =
            self.active.lock().unwrap().drain().collect();
        for (campaign_id, handle) in handles {
            let _ = handle.cancel.send(true);
            if let Err(err) = handle.join.await {
                tracing::warn!(campaign_id = %campaign_id, error = %err, "Subscription worker panicked");
            }
        }
    }
}

/// Waits out the retry delay; returns false if cancelled first.
async fn wait_retry(cancel_rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel_rx.changed() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Picks the sequence a fresh subscription starts after: the persisted
/// cursor when one exists, otherwise the current head — a campaign seen
/// for the first time skips its historical backlog.
async fn starting_seq<S: CacheStore, E: EventSource>(
    store: &S,
    reader: &EventLogReader<E>,
    campaign_id: Uuid,
) -> anyhow::Result<u64> {
    if let Some(cursor) = store
        .get_cursor(campaign_id)
        .await
        .context("reading cursor")?
    {
        return Ok(cursor.latest_seq);
    }
    reader
        .head_seq(campaign_id)
        .await
        .context("reading log head")
}

/// One campaign's subscription loop: open the stream, track position,
/// reopen after the retry delay on any termination, exit on cancel.
async fn run_subscription_worker<S, E>(
    store: Arc<S>,
    source: Arc<E>,
    reader: EventLogReader<E>,
    campaign_id: Uuid,
    retry_delay: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) where
    S: CacheStore,
    E: EventSource,
{
    let mut local_seq = loop {
        if *cancel_rx.borrow() {
            return;
        }
        match starting_seq(store.as_ref(), &reader, campaign_id).await {
            Ok(seq) => break seq,
            Err(err) => {
                tracing::warn!(campaign_id = %campaign_id, error = %err, "Failed to determine subscription start");
                if !wait_retry(&mut cancel_rx, retry_delay).await {
                    return;
                }
            }
        }
    };

    loop {
        if *cancel_rx.borrow() {
            return;
        }
        match source
            .subscribe(campaign_id, local_seq, &[UpdateKind::ProjectionApplied])
            .await
        {
            Ok(mut stream) => {
                tracing::debug!(campaign_id = %campaign_id, after_seq = local_seq, "Subscription stream opened");
                loop {
                    tokio::select! {
                        _ = cancel_rx.changed() => return,
                        item = stream.next() => match item {
                            Some(Ok(update)) => {
                                // Position only; update content is not ours
                                // to interpret.
                                if update.seq > local_seq {
                                    local_seq = update.seq;
                                    tracing::trace!(campaign_id = %campaign_id, seq = update.seq, "Live update received");
                                }
                            }
                            Some(Err(err)) => {
                                tracing::warn!(campaign_id = %campaign_id, error = %err, "Subscription stream error");
                                break;
                            }
                            None => {
                                tracing::debug!(campaign_id = %campaign_id, "Subscription stream ended");
                                break;
                            }
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(campaign_id = %campaign_id, error = %err, "Failed to open subscription stream");
            }
        }

        if !wait_retry(&mut cancel_rx, retry_delay).await {
            return;
        }
    }
}
