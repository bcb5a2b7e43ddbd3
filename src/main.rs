//! criclive server: wires storage, the event bus and the scoring service behind the HTTP API.

mod config;

use std::sync::Arc;
use anyhow::Result;
use crate::config::{AppConfig, StorageBackend};
use criclive_api::{app, AppState};
use criclive_db::{DatabaseConnection, InMemoryStore, PgStore, PlayerDirectory, ScoreRepository};
use criclive_services::{ScoringMetrics, ScoringService};
use criclive_stream::{EventBus, FanoutNotifier, RedisStream};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str =
    "criclive=debug,criclive_api=debug,criclive_services=debug,criclive_db=info,criclive_stream=info,tower_http=debug";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(config: &AppConfig) -> Result<(Arc<dyn ScoreRepository>, Arc<dyn PlayerDirectory>)> {
    match config.database.backend {
        StorageBackend::Memory => {
            info!("🗄️ Using in-memory storage; scores are lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok((store.clone(), store))
        }
        StorageBackend::Postgres => {
            let db = DatabaseConnection::new(&config.database.url, config.database.max_connections).await?;
            if !db.health_check().await? {
                warn!("⚠️ Database health check did not return the expected row");
            }
            if config.database.run_migrations {
                db.run_migrations().await?;
            }
            let store = Arc::new(PgStore::new(db.pool().clone()));
            Ok((store.clone(), store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Could not listen for shutdown signal: {}", e);
    }
    info!("👋 Shutting down gracefully");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::new()?;
    init_tracing(config.monitoring.log_json);

    info!("🚀 Starting CricLive scoring server");
    info!("🌐 Server will bind to: {}", config.server_addr());
    info!(
        "🏏 Default format: {} overs, {} balls per over, {} players per side",
        config.scoring.overs_limit, config.scoring.balls_per_over, config.scoring.players_per_side
    );

    let (repository, directory) = open_store(&config).await?;

    // Viewers in this process get updates over the event bus; Redis is optional
    let events = EventBus::new();
    let mut notifier = FanoutNotifier::new().with_sink(Arc::new(events.clone()));
    if let Some(url) = &config.redis.url {
        match RedisStream::new(url, config.redis.stream_key.clone(), config.redis.max_len).await {
            Ok(stream) => notifier = notifier.with_sink(Arc::new(stream)),
            Err(e) => warn!("⚠️ Redis unavailable, live updates stay in-process: {}", e),
        }
    }

    let scoring = ScoringService::new(repository, directory, Arc::new(notifier), ScoringMetrics::new()?)
        .with_default_rules(config.scoring.clone());
    let state = AppState::new(Arc::new(scoring), events).with_metrics(config.monitoring.metrics_enabled);

    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    info!("✅ Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
