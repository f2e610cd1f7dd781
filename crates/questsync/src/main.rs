mod coherence;
mod config;
mod source;
mod store;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::{signal, sync::broadcast};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::{
    coherence::{Reconciler, SubscriptionManager},
    config::Config,
    source::MemoryEventSource,
    store::MemoryCacheStore,
};

/// QuestSync - Cache coherence daemon for the questsync game service
#[derive(Parser, Debug)]
#[command(name = "questsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Run a single reconciliation pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questsync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Configuration loaded");

    // In-memory backends; deployments wire their own CacheStore/EventSource
    // implementations behind the same loops.
    let store = Arc::new(MemoryCacheStore::new(config.cache_max_entries));
    let source = Arc::new(MemoryEventSource::new());

    // Seed a demo campaign so a default run has something to reconcile.
    let campaign_id = Uuid::new_v4();
    store.track_campaign(campaign_id).await;
    source.append(campaign_id, "campaign.created").await;
    source.append(campaign_id, "participant.joined").await;
    source.append(campaign_id, "session.scheduled").await;
    tracing::info!(campaign_id = %campaign_id, "Demo campaign seeded");

    let reconciler = Reconciler::new(store.clone(), source.clone(), &config);

    if cli.once {
        reconciler.tick().await?;
        return Ok(());
    }

    let subscriptions = SubscriptionManager::new(store, source, &config);

    let (shutdown_tx, _) = broadcast::channel(1);
    let reconciler_handle = tokio::spawn(reconciler.run(shutdown_tx.subscribe()));
    let subscriptions_handle = tokio::spawn(subscriptions.run(shutdown_tx.subscribe()));

    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());

    reconciler_handle.await?;
    subscriptions_handle.await?;

    tracing::info!("Coherence daemon stopped");
    Ok(())
}
