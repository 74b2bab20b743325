//! Common test utilities for fishbowl integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use fishbowl_core::{Account, Notification, UserId, Video, VideoId};
use fishbowl_service::{
    create_router, AppState, InProcessChannel, NotificationConsumer, ServiceConfig,
};
use fishbowl_store::{RocksStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the store, for seeding and asserting.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and a running
    /// notification consumer.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let (channel, rx) = InProcessChannel::new();
        let _consumer = NotificationConsumer::new(store.clone()).spawn(rx);

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            lock_wait_ms: 1000,
            lock_lease_ms: 1000,
            cache_ttl_seconds: 1800,
            nats_url: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(store.clone(), Arc::new(channel), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Seed an account with the given nickname and balance.
    pub fn seed_account(&self, nickname: &str, balance: i64) -> UserId {
        let user_id = UserId::generate();
        let mut account = Account::new(user_id, nickname.to_lowercase(), nickname);
        account.fish_balance = balance;
        self.store.put_account(&account).expect("seed account");
        user_id
    }

    /// Seed a video owned by the given user.
    pub fn seed_video(&self, owner_id: UserId, title: &str) -> VideoId {
        let video_id = VideoId::generate();
        self.store
            .put_video(&Video::new(video_id, owner_id, title, ""))
            .expect("seed video");
        video_id
    }

    /// Wait until the consumer has persisted `count` notifications for the
    /// recipient, or panic after a short deadline.
    pub async fn await_notifications(&self, recipient_id: UserId, count: usize) -> Vec<Notification> {
        for _ in 0..100 {
            let notifications = self
                .store
                .list_notifications_by_recipient(&recipient_id, 100, 0)
                .expect("list notifications");
            if notifications.len() >= count {
                return notifications;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {count} notifications for {recipient_id}");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
