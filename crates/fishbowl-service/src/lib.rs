//! Fishbowl HTTP API Service.
//!
//! This crate provides the fish-feeding surface of the fishbowl backend:
//!
//! - The feed transaction (balance debit, counter credit, ledger entry)
//! - Daily fish reward claims
//! - Cached video detail views
//! - The notification pipeline (publisher, channel, consumer)
//!
//! # Notification delivery
//!
//! The service supports two channel backends:
//!
//! 1. **In-process** (default) - A tokio mpsc queue; publisher and consumer
//!    live in the same process.
//! 2. **NATS JetStream** (`nats` feature) - A broker-backed stream with a
//!    durable pull consumer, for multi-node deployments.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Read-only handlers stay async for consistency

pub mod cache;
pub mod channel;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod lock;
#[cfg(feature = "nats")]
pub mod nats;
pub mod routes;
pub mod state;

pub use cache::DetailCache;
pub use channel::{InProcessChannel, NotificationPublisher, PublishError};
pub use config::ServiceConfig;
pub use consumer::NotificationConsumer;
pub use error::ApiError;
pub use feed::FeedService;
pub use lock::LeaseLockManager;
pub use routes::create_router;
pub use state::AppState;
