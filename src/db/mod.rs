mod order_store;

pub use order_store::ScyllaOrderStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A document with this id already exists. Redelivered messages end up
    /// here, as do genuine id collisions; the two are not told apart.
    #[error("Conflict: order {id} already exists")]
    Conflict { id: String },

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Unexpected store response: {0}")]
    Response(String),
}
