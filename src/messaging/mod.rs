mod delivery;
mod listener;
mod redpanda;

pub use delivery::{Delivery, DeliveryTracker};
pub use listener::{ListenerSettings, QueueListener};
pub use redpanda::RedpandaClient;

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Failed to create Redpanda client: {0}")]
    Client(String),

    #[error("Failed to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("Failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },

    #[error("Failed to rewind {topic}[{partition}] to offset {offset}: {reason}")]
    Seek {
        topic: String,
        partition: i32,
        offset: i64,
        reason: String,
    },
}
