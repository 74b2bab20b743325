//! Application state.

use std::sync::Arc;
use std::time::Duration;

use fishbowl_store::RocksStore;

use crate::cache::DetailCache;
use crate::channel::NotificationPublisher;
use crate::config::ServiceConfig;
use crate::feed::FeedService;
use crate::lock::LeaseLockManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Feed transaction orchestrator.
    pub feed: Arc<FeedService>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state, wiring the feed service to the given
    /// notification publisher.
    #[must_use]
    pub fn new(
        store: Arc<RocksStore>,
        publisher: Arc<dyn NotificationPublisher>,
        config: ServiceConfig,
    ) -> Self {
        let cache = Arc::new(DetailCache::with_ttl(Duration::from_secs(
            config.cache_ttl_seconds,
        )));

        let feed = Arc::new(
            FeedService::new(store.clone(), Arc::new(LeaseLockManager::new()), cache, publisher)
                .with_lock_timeouts(
                    Duration::from_millis(config.lock_wait_ms),
                    Duration::from_millis(config.lock_lease_ms),
                ),
        );

        Self {
            store,
            feed,
            config,
        }
    }
}
