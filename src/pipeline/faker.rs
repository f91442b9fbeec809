use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Range;
use uuid::Uuid;

use crate::models::Order;

// ============================================================================
// Order Faker - synthetic orders for the producer
// ============================================================================

const ADJECTIVES: &[&str] = &[
    "Small", "Ergonomic", "Rustic", "Intelligent", "Gorgeous", "Incredible",
    "Fantastic", "Practical", "Sleek", "Awesome", "Generic", "Handcrafted",
    "Handmade", "Licensed", "Refined", "Unbranded", "Tasty", "Durable",
];

const MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber",
    "Metal", "Soft", "Fresh", "Frozen", "Bronze", "Marble", "Leather",
];

const PRODUCTS: &[&str] = &[
    "Chair", "Car", "Computer", "Keyboard", "Mouse", "Bike", "Ball", "Gloves",
    "Pants", "Shirt", "Table", "Shoes", "Hat", "Towels", "Soap", "Tuna",
    "Chicken", "Fish", "Cheese", "Bacon", "Pizza", "Salad", "Sausages", "Chips",
];

pub const DEFAULT_PRICE_RANGE: Range<f64> = 9.99..19.99;

pub struct OrderFaker {
    price_range: Range<f64>,
}

impl Default for OrderFaker {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_RANGE)
    }
}

impl OrderFaker {
    pub fn new(price_range: Range<f64>) -> Self {
        Self { price_range }
    }

    /// One order with a fresh v4 id
    pub fn order<R: Rng + ?Sized>(&self, rng: &mut R) -> Order {
        Order::new(
            Uuid::new_v4().to_string(),
            product_name(rng),
            rng.gen_range(self.price_range.clone()),
        )
    }

    pub fn generate(&self, count: usize) -> Vec<Order> {
        let mut rng = rand::thread_rng();
        (0..count).map(|_| self.order(&mut rng)).collect()
    }
}

fn product_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = pick(ADJECTIVES, rng);
    let material = pick(MATERIALS, rng);
    let product = pick(PRODUCTS, rng);
    format!("{adjective} {material} {product}")
}

fn pick<R: Rng + ?Sized>(words: &[&'static str], rng: &mut R) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}
