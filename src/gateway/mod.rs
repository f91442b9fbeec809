// ============================================================================
// Order Store Gateway
// ============================================================================
//
// Single point of contact between the pipelines and the two external systems:
// - the order queue (Redpanda), reached through `MessagePublisher`
// - the partitioned order store (ScyllaDB), reached through `OrderDocumentStore`
//
// The pipelines only see the `OrderGateway` trait. Every fault coming out of a
// collaborator is logged here with the operation name and then returned to the
// caller unchanged. Nothing is retried or swallowed at this layer.
//
// ============================================================================

mod order_gateway;

pub use order_gateway::OrderStoreGateway;

use async_trait::async_trait;

use crate::db::StoreError;
use crate::messaging::MessagingError;
use crate::models::Order;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Order id must not be empty")]
    MissingId,

    #[error("Failed to serialize order: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GatewayError {
    /// Short label used in metrics
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::MissingId => "invalid",
            GatewayError::Serialization(_) => "serialization",
            GatewayError::Messaging(_) => "broker",
            GatewayError::Store(StoreError::Conflict { .. }) => "conflict",
            GatewayError::Store(_) => "store",
        }
    }
}

/// The two operations the pipelines need from the outside world.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Publish `order` as one JSON message on the order queue
    async fn send_order_message(&self, order: &Order) -> Result<(), GatewayError>;

    /// Create-only insert of `order` into the store, partitioned by id
    async fn save_order_message(&self, order: &Order) -> Result<(), GatewayError>;
}

/// Publishes an opaque text payload to a named topic.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), MessagingError>;
}

/// Partitioned document store keyed by order id.
#[async_trait]
pub trait OrderDocumentStore: Send + Sync {
    /// Insert a new document. Fails with `StoreError::Conflict` if the id exists.
    async fn create_order(&self, order: &Order) -> Result<(), StoreError>;
}
