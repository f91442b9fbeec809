use futures_util::StreamExt;
use kameo::actor::ActorRef;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::{BorrowedMessage, Message},
    Offset,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{Delivery, DeliveryTracker, MessagingError, RedpandaClient};
use crate::health::{HealthMonitorActor, HealthStatus, UpdateHealth};
use crate::metrics::Metrics;

// ============================================================================
// Queue Listener - at-least-once delivery of queued order messages
// ============================================================================
//
// Invokes the handler once per received message. The offset is committed only
// after the handler returns Ok. On Err the message is redelivered by seeking
// back to it, until `max_delivery_attempts` is reached and it is parked on the
// dead-letter topic.
//
// ============================================================================

const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub brokers: String,
    pub consumer_group: String,
    pub topic: String,
    pub dead_letter_topic: String,
    pub max_delivery_attempts: u32,
    pub redelivery_delay: Duration,
}

/// What happens to a received message once its handler has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Commit the offset, the message is done
    Commit,
    /// Leave the offset uncommitted and seek back to the message
    Rewind { attempt: u32 },
    /// Publish to the dead-letter topic before deciding
    DeadLetter { attempts: u32 },
}

/// Only a successful handler leads to a commit.
pub(crate) fn next_action<E>(
    handled: &Result<(), E>,
    tracker: &mut DeliveryTracker,
    partition: i32,
    offset: i64,
) -> Action {
    if handled.is_ok() {
        tracker.acknowledge(partition, offset);
        return Action::Commit;
    }

    match tracker.record_failure(partition, offset) {
        Delivery::Redeliver { attempt } => Action::Rewind { attempt },
        Delivery::DeadLetter { attempts } => Action::DeadLetter { attempts },
    }
}

/// A parked message is committed; if parking failed the message is kept.
pub(crate) fn after_dead_letter<E>(
    parked: &Result<(), E>,
    attempts: u32,
    tracker: &mut DeliveryTracker,
    partition: i32,
    offset: i64,
) -> Action {
    if parked.is_ok() {
        tracker.acknowledge(partition, offset);
        Action::Commit
    } else {
        Action::Rewind { attempt: attempts + 1 }
    }
}

pub struct QueueListener {
    consumer: StreamConsumer,
    settings: ListenerSettings,
    dead_letters: Arc<RedpandaClient>,
    metrics: Arc<Metrics>,
    health: Option<ActorRef<HealthMonitorActor>>,
}

impl QueueListener {
    pub fn new(
        settings: ListenerSettings,
        dead_letters: Arc<RedpandaClient>,
        metrics: Arc<Metrics>,
        health: Option<ActorRef<HealthMonitorActor>>,
    ) -> Result<Self, MessagingError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("group.id", &settings.consumer_group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| MessagingError::Client(e.to_string()))?;

        consumer
            .subscribe(&[settings.topic.as_str()])
            .map_err(|e| MessagingError::Subscribe {
                topic: settings.topic.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            topic = %settings.topic,
            consumer_group = %settings.consumer_group,
            max_delivery_attempts = settings.max_delivery_attempts,
            "Subscribed to order queue"
        );

        Ok(Self {
            consumer,
            settings,
            dead_letters,
            metrics,
            health,
        })
    }

    /// Run until the consumer stream ends. `handler` receives the raw message
    /// body; a missing or non UTF-8 body is passed as an empty string.
    pub async fn run<F, Fut, E>(self, handler: F) -> Result<(), MessagingError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let mut tracker = DeliveryTracker::new(self.settings.max_delivery_attempts);
        let mut stream = self.consumer.stream();

        tracing::info!(topic = %self.settings.topic, "🎧 Listening for order messages");

        while let Some(next) = stream.next().await {
            let message = match next {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to receive message from Redpanda");
                    self.report("broker", HealthStatus::Degraded(e.to_string())).await;
                    continue;
                }
            };

            tracker.received(message.partition(), message.offset());

            let body = message
                .payload()
                .and_then(|p| std::str::from_utf8(p).ok())
                .unwrap_or_default()
                .to_string();

            let handled = handler(body).await.map_err(|e| e.to_string());
            let action = match next_action(&handled, &mut tracker, message.partition(), message.offset()) {
                Action::DeadLetter { attempts } => {
                    let error = handled.as_ref().err().map(String::as_str).unwrap_or_default();
                    let parked = self.dead_letter(&message, error, attempts).await;
                    after_dead_letter(&parked, attempts, &mut tracker, message.partition(), message.offset())
                }
                action => action,
            };

            match action {
                Action::Commit => {
                    self.commit(&message);
                    if handled.is_ok() {
                        self.report("consumer", HealthStatus::Healthy).await;
                    }
                }
                Action::Rewind { attempt } => {
                    tracing::warn!(
                        partition = message.partition(),
                        offset = message.offset(),
                        next_attempt = attempt,
                        pending = tracker.pending(),
                        error = handled.as_ref().err().map(String::as_str).unwrap_or_default(),
                        "Message not acknowledged, scheduling redelivery"
                    );
                    self.metrics.record_redelivery();
                    tokio::time::sleep(self.settings.redelivery_delay).await;

                    if let Err(e) = self.rewind(&message) {
                        // The offset stays uncommitted, so the partition's next
                        // owner starts from it again.
                        tracing::warn!(error = %e, "Rewind failed, continuing with the stream");
                        self.report("broker", HealthStatus::Degraded(e.to_string())).await;
                    }
                }
                Action::DeadLetter { .. } => {}
            }
        }

        tracing::info!(topic = %self.settings.topic, "Order queue stream ended");
        Ok(())
    }

    fn commit(&self, message: &BorrowedMessage<'_>) {
        tracing::debug!(
            partition = message.partition(),
            offset = message.offset(),
            state = "acknowledged",
            "Committing message offset"
        );

        if let Err(e) = self.consumer.commit_message(message, CommitMode::Async) {
            // Uncommitted offsets are redelivered after a rebalance; the
            // store's create-only insert rejects the duplicate.
            tracing::warn!(
                partition = message.partition(),
                offset = message.offset(),
                error = %e,
                "Failed to commit offset (message may be redelivered)"
            );
        }
    }

    fn rewind(&self, message: &BorrowedMessage<'_>) -> Result<(), MessagingError> {
        self.consumer
            .seek(
                message.topic(),
                message.partition(),
                Offset::Offset(message.offset()),
                SEEK_TIMEOUT,
            )
            .map_err(|e| MessagingError::Seek {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                reason: e.to_string(),
            })
    }

    async fn dead_letter(
        &self,
        message: &BorrowedMessage<'_>,
        error: &str,
        attempts: u32,
    ) -> Result<(), MessagingError> {
        let parked = self
            .dead_letters
            .publish_dead_letter(
                &self.settings.dead_letter_topic,
                message.key(),
                message.payload(),
                error,
                attempts,
            )
            .await;

        match &parked {
            Ok(()) => {
                tracing::error!(
                    partition = message.partition(),
                    offset = message.offset(),
                    attempts = attempts,
                    error = %error,
                    dead_letter_topic = %self.settings.dead_letter_topic,
                    "Message exceeded delivery attempts"
                );
                self.metrics.record_dlq_message();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to publish to dead-letter topic");
                self.report("broker", HealthStatus::Unhealthy(e.to_string())).await;
            }
        }
        parked
    }

    async fn report(&self, component: &str, status: HealthStatus) {
        if let Some(ref health) = self.health {
            let _ = health
                .tell(UpdateHealth {
                    component: component.to_string(),
                    status,
                    details: None,
                })
                .send()
                .await;
        }
    }
}
