use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    message::{Header, OwnedHeaders},
    producer::{FutureProducer, FutureRecord},
};
use std::time::Duration;

use super::MessagingError;
use crate::gateway::MessagePublisher;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Long-lived Redpanda producer shared by every pipeline invocation.
pub struct RedpandaClient {
    producer: FutureProducer,
}

impl RedpandaClient {
    pub fn new(brokers: &str) -> Result<Self, MessagingError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| MessagingError::Client(e.to_string()))?;

        tracing::info!(brokers = %brokers, "Redpanda producer created");

        Ok(Self { producer })
    }

    /// Publish one message and wait for the broker acknowledgement
    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), MessagingError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record, rdkafka::util::Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(e, _)| MessagingError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(topic = %topic, key = %key, "Published to Redpanda");
        Ok(())
    }

    /// Park a message that exhausted its delivery attempts.
    /// The original bytes are kept untouched, the failure goes into headers.
    pub async fn publish_dead_letter(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: Option<&[u8]>,
        error: &str,
        attempts: u32,
    ) -> Result<(), MessagingError> {
        let attempts = attempts.to_string();
        let headers = OwnedHeaders::new()
            .insert(Header { key: "error", value: Some(error) })
            .insert(Header { key: "delivery-attempts", value: Some(attempts.as_str()) });

        let mut record: FutureRecord<'_, [u8], [u8]> = FutureRecord::to(topic).headers(headers);
        if let Some(key) = key {
            record = record.key(key);
        }
        if let Some(payload) = payload {
            record = record.payload(payload);
        }

        self.producer
            .send(record, rdkafka::util::Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(e, _)| MessagingError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        tracing::warn!(topic = %topic, attempts = %attempts, "💀 Message moved to dead-letter topic");
        Ok(())
    }
}

#[async_trait]
impl MessagePublisher for RedpandaClient {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), MessagingError> {
        RedpandaClient::publish(self, topic, key, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redpanda_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedpandaClient>();
    }

    #[test]
    fn producer_creation_does_not_need_a_running_broker() {
        // librdkafka connects lazily
        assert!(RedpandaClient::new("127.0.0.1:1").is_ok());
    }
}
