use std::sync::Arc;

use super::faker::OrderFaker;
use crate::gateway::{GatewayError, OrderGateway};
use crate::metrics::Metrics;
use crate::models::Order;

// ============================================================================
// Producer Pipeline (SendOrders)
// ============================================================================
//
// Generates a batch of synthetic orders and sends them one at a time, in the
// order they were generated. The first failed send stops the run. Orders that
// were already sent stay sent: the batch is not transactional.
//
// ============================================================================

pub const ORDER_BATCH_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("Failed to send order {order_id} after {sent} of {total} orders were sent: {source}")]
    Send {
        order_id: String,
        sent: usize,
        total: usize,
        source: GatewayError,
    },
}

pub struct SendOrders<G> {
    gateway: Arc<G>,
    faker: OrderFaker,
    metrics: Arc<Metrics>,
}

impl<G: OrderGateway> SendOrders<G> {
    pub fn new(gateway: Arc<G>, metrics: Arc<Metrics>) -> Self {
        Self {
            gateway,
            faker: OrderFaker::default(),
            metrics,
        }
    }

    /// Generate and send one full batch. Returns how many orders were sent.
    pub async fn run(&self) -> Result<usize, ProducerError> {
        tracing::info!("Creating Orders");
        let orders = self.faker.generate(ORDER_BATCH_SIZE);

        let result = self.send_all(&orders).await;
        self.metrics.record_producer_run(result.is_ok());

        if let Err(ref e) = result {
            tracing::error!(error = %e, "Exception thrown in SendOrders: {}", e);
        }
        result
    }

    /// Send `orders` strictly in sequence, stopping at the first failure
    pub async fn send_all(&self, orders: &[Order]) -> Result<usize, ProducerError> {
        tracing::info!(count = orders.len(), "Sending {} orders to the queue", orders.len());

        for (sent, order) in orders.iter().enumerate() {
            tracing::info!(order_id = %order.id, "Sending {}", order.id);

            if let Err(source) = self.gateway.send_order_message(order).await {
                self.metrics.record_send(false);
                tracing::error!(
                    order_id = %order.id,
                    product_name = %order.product_name,
                    price = order.price,
                    position = sent + 1,
                    "Order not sent, aborting batch"
                );
                return Err(ProducerError::Send {
                    order_id: order.id.clone(),
                    sent,
                    total: orders.len(),
                    source,
                });
            }

            self.metrics.record_send(true);
            tracing::info!(
                order_id = %order.id,
                product_name = %order.product_name,
                price = order.price,
                "Order sent. Details: OrderId: {} | ProductName: {} | Price: {}",
                order.id,
                order.product_name,
                order.price
            );
        }

        Ok(orders.len())
    }
}
