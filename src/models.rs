use serde::{Deserialize, Serialize};

// ============================================================================
// Order - the message payload and the stored document
// ============================================================================
//
// Wire format is a JSON object with exactly three fields:
//   { "id": "...", "productName": "...", "price": 12.5 }
//
// `id` is both the message key on the queue and the partition key in the
// document store. It is assigned once by the producer and never changes.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    pub price: f64,
}

impl Order {
    pub fn new(id: impl Into<String>, product_name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            product_name: product_name.into(),
            price,
        }
    }

    /// An order can only be sent or saved once it carries a non-empty id.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn to_message(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_message(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}
