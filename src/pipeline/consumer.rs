use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::gateway::{GatewayError, OrderGateway};
use crate::metrics::Metrics;
use crate::models::Order;

// ============================================================================
// Consumer Pipeline (SaveOrders)
// ============================================================================
//
// Invoked once per queued message:
//
//   Received → Parsed → Saved        (the listener then acknowledges)
//        └──────┴─────→ Failed       (error returned, message redelivered)
//
// A redelivered message whose order is already stored fails with a store
// conflict instead of creating a second document.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Received,
    Parsed,
    Saved,
    Failed,
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageState::Received => "received",
            MessageState::Parsed => "parsed",
            MessageState::Saved => "saved",
            MessageState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("Malformed order message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ConsumerError {
    pub fn reason(&self) -> &'static str {
        match self {
            ConsumerError::MalformedMessage(_) => "malformed",
            ConsumerError::Gateway(e) => e.reason(),
        }
    }
}

pub struct SaveOrders<G> {
    gateway: Arc<G>,
    metrics: Arc<Metrics>,
}

impl<G: OrderGateway> SaveOrders<G> {
    pub fn new(gateway: Arc<G>, metrics: Arc<Metrics>) -> Self {
        Self { gateway, metrics }
    }

    /// Parse and persist one message body. `Ok` means the message may be
    /// acknowledged; any `Err` must leave it unacknowledged.
    pub async fn run(&self, body: &str) -> Result<Order, ConsumerError> {
        let started = Instant::now();

        tracing::info!(state = %MessageState::Received, "Attempting to parse Order message");
        let order = Order::from_message(body)
            .map_err(|e| self.fail(ConsumerError::MalformedMessage(e), None, started))?;

        tracing::info!(
            order_id = %order.id,
            state = %MessageState::Parsed,
            "Saving OrderId: {} to the database",
            order.id
        );
        self.gateway
            .save_order_message(&order)
            .await
            .map_err(|e| self.fail(e.into(), Some(&order.id), started))?;

        self.metrics.record_save(None, started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            state = %MessageState::Saved,
            "OrderId: {} saved",
            order.id
        );

        Ok(order)
    }

    fn fail(&self, error: ConsumerError, order_id: Option<&str>, started: Instant) -> ConsumerError {
        self.metrics
            .record_save(Some(error.reason()), started.elapsed().as_secs_f64());
        tracing::error!(
            order_id = order_id.unwrap_or("-"),
            state = %MessageState::Failed,
            reason = error.reason(),
            error = %error,
            "Exception thrown in SaveOrders: {}",
            error
        );
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use crate::gateway::OrderStoreGateway;
    use crate::testing::{InMemoryOrderStore, InMemoryQueue};

    fn consumer(store: &Arc<InMemoryOrderStore>) -> (SaveOrders<OrderStoreGateway<InMemoryQueue, InMemoryOrderStore>>, Arc<Metrics>) {
        let queue = Arc::new(InMemoryQueue::new());
        let gateway = Arc::new(OrderStoreGateway::new(queue, store.clone(), "orders"));
        let metrics = Arc::new(Metrics::new().unwrap());
        (SaveOrders::new(gateway, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn test_saves_widget_order() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (consumer, metrics) = consumer(&store);

        let order = consumer
            .run(r#"{"id":"A1","productName":"Widget","price":12.50}"#)
            .await
            .unwrap();

        assert_eq!(order, Order::new("A1", "Widget", 12.50));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("A1"), Some(Order::new("A1", "Widget", 12.50)));
        assert_eq!(metrics.orders_saved.get(), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_persists_nothing() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (consumer, metrics) = consumer(&store);

        for body in ["", "not json", r#"{"id":"A1","price":"cheap"}"#, r#"{"productName":"x","price":1}"#] {
            let err = consumer.run(body).await.unwrap_err();
            assert!(matches!(err, ConsumerError::MalformedMessage(_)), "{body}");
        }

        assert!(store.is_empty());
        assert_eq!(store.insert_attempts(), 0);
        assert_eq!(metrics.orders_save_failed.with_label_values(&["malformed"]).get(), 4);
    }

    #[tokio::test]
    async fn test_redelivered_message_conflicts_instead_of_duplicating() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (consumer, metrics) = consumer(&store);
        let body = r#"{"id":"A1","productName":"Widget","price":12.50}"#;

        consumer.run(body).await.unwrap();
        let err = consumer.run(body).await.unwrap_err();

        assert!(matches!(
            err,
            ConsumerError::Gateway(GatewayError::Store(StoreError::Conflict { .. }))
        ));
        assert_eq!(err.reason(), "conflict");
        assert_eq!(store.len(), 1);
        assert_eq!(metrics.orders_saved.get(), 1);
        assert_eq!(metrics.orders_save_failed.with_label_values(&["conflict"]).get(), 1);
    }

    #[tokio::test]
    async fn test_store_fault_propagates_and_retry_succeeds() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.fail_on_insert(1);
        let (consumer, _) = consumer(&store);
        let body = r#"{"id":"B2","productName":"Gadget","price":10.0}"#;

        let err = consumer.run(body).await.unwrap_err();
        assert!(matches!(err, ConsumerError::Gateway(GatewayError::Store(StoreError::Query(_)))));
        assert!(store.is_empty());

        // Redelivery after a transient fault lands the document
        consumer.run(body).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_id_is_a_gateway_fault() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (consumer, _) = consumer(&store);

        let err = consumer
            .run(r#"{"id":"","productName":"Widget","price":1.0}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, ConsumerError::Gateway(GatewayError::MissingId)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(MessageState::Received.to_string(), "received");
        assert_eq!(MessageState::Failed.to_string(), "failed");
    }
}
