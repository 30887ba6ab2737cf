//! Wayfarer Engine - Main entry point.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_domain::CampaignId;

use wayfarer_engine::app::{App, Repositories};
use wayfarer_engine::infrastructure::{
    clock::SystemClock, in_memory::SeedData, settings::EngineSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfarer_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Wayfarer Engine");

    // Load configuration
    let settings = EngineSettings::from_env();
    tracing::info!(
        debounce_ms = settings.clock.debounce_window.as_millis() as u64,
        advance_timeout_ms = settings.clock.advance_timeout.as_millis() as u64,
        idle_ttl_secs = settings.clock.idle_ttl.as_secs(),
        jump_test_mode = settings.jump_rules.skip_fuel_check,
        "Clock settings loaded"
    );

    // Load seed records into the in-memory store
    let seed = match &settings.seed_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading seed records");
            SeedData::load(path).await?
        }
        None => {
            tracing::warn!("WAYFARER_SEED_FILE not set, starting with an empty record store");
            SeedData::default()
        }
    };
    let campaign_ids: Vec<CampaignId> = seed.campaigns.iter().map(|c| c.id()).collect();

    // Create application
    let app = Arc::new(App::new(
        Repositories::from_seed(seed),
        Arc::new(SystemClock::new()),
        &settings,
    ));

    // Attach interval callbacks for every known campaign
    let mut handles = Vec::new();
    for campaign_id in campaign_ids {
        handles.extend(app.attach_campaign(campaign_id)?);
    }
    tracing::info!(callbacks = handles.len(), "Campaign clocks ready");

    // Report ships that came due through debounced advances
    let flush_watch = app.use_cases.time.advance.watch_flushes();

    // Spawn idle campaign eviction
    if let Some(every) = settings.eviction_sweep {
        let sweep_app = app.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = sweep_app.coordinator.evict_idle();
                if let Err(e) = sweep_app.coordinator.prune_retired().await {
                    tracing::warn!(error = %e, "Failed to prune retired campaign versions");
                }
                tracing::debug!(
                    evicted,
                    remaining = sweep_app.coordinator.campaign_count(),
                    retired = sweep_app.coordinator.retired_count(),
                    "Idle campaign sweep"
                );
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    flush_watch.abort();
    for handle in handles {
        let _ = handle.unregister();
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
