use async_trait::async_trait;
use std::sync::Arc;

use super::{GatewayError, MessagePublisher, OrderDocumentStore, OrderGateway};
use crate::models::Order;

pub struct OrderStoreGateway<P, S> {
    publisher: Arc<P>,
    store: Arc<S>,
    queue_name: String,
}

impl<P, S> OrderStoreGateway<P, S>
where
    P: MessagePublisher,
    S: OrderDocumentStore,
{
    pub fn new(publisher: Arc<P>, store: Arc<S>, queue_name: impl Into<String>) -> Self {
        Self {
            publisher,
            store,
            queue_name: queue_name.into(),
        }
    }

    async fn publish(&self, order: &Order) -> Result<(), GatewayError> {
        if !order.has_id() {
            return Err(GatewayError::MissingId);
        }
        let message = order.to_message()?;
        self.publisher.publish(&self.queue_name, &order.id, &message).await?;
        Ok(())
    }

    async fn persist(&self, order: &Order) -> Result<(), GatewayError> {
        if !order.has_id() {
            return Err(GatewayError::MissingId);
        }
        self.store.create_order(order).await?;
        Ok(())
    }
}

#[async_trait]
impl<P, S> OrderGateway for OrderStoreGateway<P, S>
where
    P: MessagePublisher,
    S: OrderDocumentStore,
{
    async fn send_order_message(&self, order: &Order) -> Result<(), GatewayError> {
        self.publish(order).await.inspect_err(|e| {
            tracing::error!(
                operation = "send_order_message",
                order_id = %order.id,
                error = %e,
                "Exception thrown in send_order_message: {}",
                e
            );
        })
    }

    async fn save_order_message(&self, order: &Order) -> Result<(), GatewayError> {
        self.persist(order).await.inspect_err(|e| {
            tracing::error!(
                operation = "save_order_message",
                order_id = %order.id,
                error = %e,
                "Exception thrown in save_order_message: {}",
                e
            );
        })
    }
}
