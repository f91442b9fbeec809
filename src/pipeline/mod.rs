// ============================================================================
// Order Pipelines
// ============================================================================
//
// - producer: SendOrders, HTTP-triggered batch publisher
// - consumer: SaveOrders, invoked once per queued message
// - faker:    synthetic order data for the producer
//
// Both pipelines only talk to the outside world through `OrderGateway`.
//
// ============================================================================

mod consumer;
mod faker;
mod producer;

pub use consumer::SaveOrders;
pub use producer::{SendOrders, ORDER_BATCH_SIZE};
