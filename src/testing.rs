// ============================================================================
// In-memory collaborators for tests
// ============================================================================
//
// Stand-ins for Redpanda and ScyllaDB with the same observable contract:
// - InMemoryQueue records every acknowledged publish, in order
// - InMemoryOrderStore rejects a second insert for the same id
// Both can be scripted to fail on the n-th call.
//
// ============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::StoreError;
use crate::gateway::{MessagePublisher, OrderDocumentStore};
use crate::messaging::MessagingError;
use crate::models::Order;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

#[derive(Default)]
pub struct InMemoryQueue {
    published: Mutex<Vec<PublishedMessage>>,
    attempts: Mutex<usize>,
    fail_on: Mutex<Option<usize>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th publish attempt (1-based) fail
    pub fn fail_on_publish(&self, attempt: usize) {
        *self.fail_on.lock().unwrap() = Some(attempt);
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn publish_attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Hand every queued payload over, oldest first
    pub fn drain(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .drain(..)
            .map(|message| message.payload)
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryQueue {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), MessagingError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };

        if *self.fail_on.lock().unwrap() == Some(attempt) {
            return Err(MessagingError::Publish {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }

        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    documents: Mutex<HashMap<String, Order>>,
    attempts: Mutex<usize>,
    fail_on: Mutex<Option<usize>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th insert attempt (1-based) fail with a query error
    pub fn fail_on_insert(&self, attempt: usize) {
        *self.fail_on.lock().unwrap() = Some(attempt);
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl OrderDocumentStore for InMemoryOrderStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };

        if *self.fail_on.lock().unwrap() == Some(attempt) {
            return Err(StoreError::Query("store unavailable".to_string()));
        }

        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(&order.id) {
            return Err(StoreError::Conflict { id: order.id.clone() });
        }
        documents.insert(order.id.clone(), order.clone());
        Ok(())
    }
}
