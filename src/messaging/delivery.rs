use std::collections::HashMap;

// ============================================================================
// Delivery Tracker - redelivery policy for unacknowledged messages
// ============================================================================
//
// Kafka only tracks a committed offset per partition, so "redeliver this
// message" is done by seeking back to it. The tracker counts how many times
// each (partition, offset) has failed and decides between another delivery
// and the dead-letter topic.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Seek back and hand the message to the handler again
    Redeliver { attempt: u32 },
    /// Give up and move the message to the dead-letter topic
    DeadLetter { attempts: u32 },
}

#[derive(Debug)]
pub struct DeliveryTracker {
    max_delivery_attempts: u32,
    failures: HashMap<(i32, i64), u32>,
}

impl DeliveryTracker {
    pub fn new(max_delivery_attempts: u32) -> Self {
        Self {
            max_delivery_attempts: max_delivery_attempts.max(1),
            failures: HashMap::new(),
        }
    }

    /// Record a failed delivery and decide what happens next
    pub fn record_failure(&mut self, partition: i32, offset: i64) -> Delivery {
        let failures = self.failures.entry((partition, offset)).or_insert(0);
        *failures += 1;

        if *failures >= self.max_delivery_attempts {
            Delivery::DeadLetter { attempts: *failures }
        } else {
            Delivery::Redeliver { attempt: *failures + 1 }
        }
    }

    /// Note a received message. Counts for other offsets of the same
    /// partition are dropped: a message we did not rewind to was either
    /// committed or its partition was revoked and reassigned.
    pub fn received(&mut self, partition: i32, offset: i64) {
        self.failures
            .retain(|&(p, o), _| p != partition || o == offset);
    }

    /// Forget a message once it has been acknowledged
    pub fn acknowledge(&mut self, partition: i32, offset: i64) {
        self.failures.remove(&(partition, offset));
    }

    pub fn pending(&self) -> usize {
        self.failures.len()
    }
}
