// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::aggregator::Aggregator;
use crate::application::collector::Collector;
use crate::application::query_service::QueryService;
use crate::application::scheduler::{SHUTDOWN_GRACE, Scheduler};
use crate::application::weather_repository::{SampleStore, SummaryStore};
use crate::infrastructure::config::{StorageSettings, load_settings};
use crate::infrastructure::influx_store::InfluxStore;
use crate::infrastructure::memory_store::MemoryStore;
use crate::infrastructure::openweather_client::OpenWeatherClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = load_settings()?;
    let schedule = settings.schedule_settings()?;

    // Create stores (infrastructure layer)
    let (samples, summaries) = match &settings.storage {
        StorageSettings::Memory => {
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn SampleStore>, store as Arc<dyn SummaryStore>)
        }
        StorageSettings::Influx(influx) => {
            tracing::info!("Using InfluxDB at {} (database {})", influx.host, influx.database);
            let store = Arc::new(InfluxStore::new(
                influx.host.clone(),
                influx.token.clone(),
                influx.database.clone(),
                influx.retention_policy.clone(),
            ));
            (store.clone() as Arc<dyn SampleStore>, store as Arc<dyn SummaryStore>)
        }
    };
    let source = Arc::new(OpenWeatherClient::new(
        settings.provider.base_url.clone(),
        settings.provider.api_key.clone(),
    ));

    // Create services (application layer)
    let collector = Collector::new(source, samples.clone(), settings.fetch_timeout());
    let aggregator = Aggregator::new(samples.clone(), summaries.clone());
    let query_service = QueryService::new(samples, summaries);

    let scheduler = Scheduler::new(settings.cities.clone(), collector, aggregator, schedule);
    let scheduler_handle = scheduler.spawn();

    // Build router (presentation layer)
    let router = create_router(AppState { query_service });

    // Start server
    let addr = settings.server.listen;
    tracing::info!("Starting weather rollup service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_handle.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
