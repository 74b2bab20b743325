//! NATS JetStream notification channel backend.
//!
//! Multi-node deployments publish notification events to a JetStream stream
//! instead of the in-process queue; a durable pull consumer drains it. The
//! wire contract is identical to the in-process channel (the same JSON
//! payloads), and delivery stays at-least-once: an event whose ack is lost is
//! redelivered and persisted again.

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{self, consumer::PullConsumer};
use async_trait::async_trait;
use futures::StreamExt;

use fishbowl_core::NotificationEvent;
use fishbowl_store::Store;

use crate::channel::{NotificationPublisher, PublishError};
use crate::consumer::NotificationConsumer;

/// JetStream stream holding notification events.
pub const STREAM_NAME: &str = "NOTIFICATIONS";
/// Subject feed events are published to.
pub const NOTIFY_SUBJECT: &str = "notify.new";
/// Durable consumer name.
pub const CONSUMER_NAME: &str = "notification_writer";

/// How many messages to pull per fetch.
const FETCH_BATCH: usize = 32;
/// How long a fetch waits for messages before returning empty.
const FETCH_EXPIRES: Duration = Duration::from_secs(5);

/// Connect to NATS and ensure the notification stream exists.
///
/// # Errors
///
/// Returns an error if the connection or stream creation fails.
pub async fn connect(nats_url: &str) -> Result<jetstream::Context, PublishError> {
    let client = async_nats::connect(nats_url)
        .await
        .map_err(|e| PublishError::Broker(format!("failed to connect to NATS: {e}")))?;

    let context = jetstream::new(client);

    context
        .get_or_create_stream(jetstream::stream::Config {
            name: STREAM_NAME.to_string(),
            subjects: vec![format!("{NOTIFY_SUBJECT}.>"), NOTIFY_SUBJECT.to_string()],
            max_age: Duration::from_secs(24 * 3600),
            ..Default::default()
        })
        .await
        .map_err(|e| PublishError::Broker(format!("failed to create stream: {e}")))?;

    Ok(context)
}

/// JetStream-backed notification publisher.
pub struct NatsChannel {
    jetstream: jetstream::Context,
}

impl NatsChannel {
    /// Wrap an established JetStream context.
    #[must_use]
    pub fn new(jetstream: jetstream::Context) -> Self {
        Self { jetstream }
    }
}

#[async_trait]
impl NotificationPublisher for NatsChannel {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        let payload =
            serde_json::to_vec(event).map_err(|e| PublishError::Serialization(e.to_string()))?;

        // Wait for the stream's ack so a dropped event is observable at the
        // call site (where it is logged, never retried).
        self.jetstream
            .publish(NOTIFY_SUBJECT.to_string(), payload.into())
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        Ok(())
    }
}

/// Durable pull-consumer loop persisting notification events.
pub struct NatsConsumer {
    jetstream: jetstream::Context,
    inner: NotificationConsumer,
}

impl NatsConsumer {
    /// Create a consumer writing to the given store.
    #[must_use]
    pub fn new(jetstream: jetstream::Context, store: Arc<dyn Store>) -> Self {
        Self {
            jetstream,
            inner: NotificationConsumer::new(store),
        }
    }

    /// Run the consume loop until the task is aborted.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream or durable consumer cannot be set up.
    /// Fetch errors inside the loop are logged and retried.
    pub async fn run(self) -> Result<(), PublishError> {
        let stream = self
            .jetstream
            .get_stream(STREAM_NAME)
            .await
            .map_err(|e| PublishError::Broker(format!("failed to get stream: {e}")))?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(
                CONSUMER_NAME,
                jetstream::consumer::pull::Config {
                    durable_name: Some(CONSUMER_NAME.to_string()),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| PublishError::Broker(format!("failed to create consumer: {e}")))?;

        tracing::info!(stream = STREAM_NAME, consumer = CONSUMER_NAME, "NATS notification consumer started");

        loop {
            let mut messages = match consumer
                .fetch()
                .max_messages(FETCH_BATCH)
                .expires(FETCH_EXPIRES)
                .messages()
                .await
            {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::error!(error = %e, "failed to fetch notification batch");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            while let Some(message) = messages.next().await {
                match message {
                    Ok(msg) => {
                        // Malformed and unprocessable payloads are dropped
                        // inside process(); ack either way so a poison
                        // message is not redelivered forever.
                        self.inner.process(&msg.payload);
                        if let Err(e) = msg.ack().await {
                            tracing::warn!(error = %e, "failed to ack notification message");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "error receiving notification message");
                    }
                }
            }
        }
    }
}
