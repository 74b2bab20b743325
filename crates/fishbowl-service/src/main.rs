//! Fishbowl Service - HTTP API for fish feeding and notifications
//!
//! This is the main entry point for the fishbowl service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fishbowl_service::{
    create_router, AppState, InProcessChannel, NotificationConsumer, ServiceConfig,
};
use fishbowl_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fishbowl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fishbowl Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        nats_configured = %config.nats_url.is_some(),
        "Service configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    // Wire the notification channel and start its consumer
    let (state, consumer_handle) = build_state(store, config.clone()).await?;

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    // The router (and with it every publisher handle) is gone; let the
    // consumer drain whatever is still queued.
    consumer_handle.await?;

    Ok(())
}

#[cfg(not(feature = "nats"))]
async fn build_state(
    store: Arc<RocksStore>,
    config: ServiceConfig,
) -> Result<(AppState, tokio::task::JoinHandle<()>), Box<dyn std::error::Error>> {
    let (channel, rx) = InProcessChannel::new();
    let consumer_handle = NotificationConsumer::new(store.clone()).spawn(rx);

    if config.nats_url.is_some() {
        tracing::warn!("NATS_URL set but the nats feature is not compiled in; using the in-process channel");
    }

    Ok((AppState::new(store, Arc::new(channel), config), consumer_handle))
}

#[cfg(feature = "nats")]
async fn build_state(
    store: Arc<RocksStore>,
    config: ServiceConfig,
) -> Result<(AppState, tokio::task::JoinHandle<()>), Box<dyn std::error::Error>> {
    use fishbowl_service::nats::{self, NatsChannel, NatsConsumer};

    match config.nats_url.as_deref() {
        Some(url) => {
            let jetstream = nats::connect(url).await?;
            tracing::info!(nats_url = %url, "NATS notification channel enabled");

            let consumer = NatsConsumer::new(jetstream.clone(), store.clone());
            let consumer_handle = tokio::spawn(async move {
                if let Err(e) = consumer.run().await {
                    tracing::error!(error = %e, "NATS notification consumer failed");
                }
            });

            let channel = NatsChannel::new(jetstream);
            Ok((AppState::new(store, Arc::new(channel), config), consumer_handle))
        }
        None => {
            tracing::warn!("NATS_URL not set; falling back to the in-process channel");
            let (channel, rx) = InProcessChannel::new();
            let consumer_handle = NotificationConsumer::new(store.clone()).spawn(rx);
            Ok((AppState::new(store, Arc::new(channel), config), consumer_handle))
        }
    }
}
