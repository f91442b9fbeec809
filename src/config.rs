use std::time::Duration;

// ============================================================================
// Configuration - environment-provided connection and naming settings
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be a plain CQL identifier, got {value:?}")]
    InvalidIdentifier { name: &'static str, value: String },

    #[error("DEAD_LETTER_QUEUE must differ from QUEUE_NAME ({0})")]
    DeadLetterIsQueue(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Redpanda bootstrap servers
    pub broker_endpoint: String,
    /// ScyllaDB contact point
    pub store_endpoint: String,
    /// Topic the producer publishes to and the consumer reads from
    pub queue_name: String,
    pub dead_letter_queue: String,
    pub consumer_group: String,
    /// Keyspace holding the orders table
    pub database_name: String,
    /// Table partitioned by order id
    pub container_name: String,
    pub http_port: u16,
    pub max_delivery_attempts: u32,
    pub redelivery_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_endpoint: "127.0.0.1:9092".to_string(),
            store_endpoint: "127.0.0.1:9042".to_string(),
            queue_name: "orders".to_string(),
            dead_letter_queue: "orders-dlq".to_string(),
            consumer_group: "order-processor".to_string(),
            database_name: "orders_ks".to_string(),
            container_name: "orders".to_string(),
            http_port: 7071,
            max_delivery_attempts: 10,
            redelivery_delay: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let queue_name = get("QUEUE_NAME").unwrap_or(defaults.queue_name);
        let dead_letter_queue = get("DEAD_LETTER_QUEUE").unwrap_or_else(|| format!("{queue_name}-dlq"));

        let config = Self {
            broker_endpoint: get("BROKER_ENDPOINT").unwrap_or(defaults.broker_endpoint),
            store_endpoint: get("STORE_ENDPOINT").unwrap_or(defaults.store_endpoint),
            queue_name,
            dead_letter_queue,
            consumer_group: get("CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            database_name: get("DATABASE_NAME").unwrap_or(defaults.database_name),
            container_name: get("CONTAINER_NAME").unwrap_or(defaults.container_name),
            http_port: parse_or("HTTP_PORT", get("HTTP_PORT"), defaults.http_port)?,
            max_delivery_attempts: parse_or(
                "MAX_DELIVERY_ATTEMPTS",
                get("MAX_DELIVERY_ATTEMPTS"),
                defaults.max_delivery_attempts,
            )?,
            redelivery_delay: Duration::from_millis(parse_or(
                "REDELIVERY_DELAY_MS",
                get("REDELIVERY_DELAY_MS"),
                defaults.redelivery_delay.as_millis() as u64,
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // Keyspace and table names end up inside CQL text
        check_identifier("DATABASE_NAME", &self.database_name)?;
        check_identifier("CONTAINER_NAME", &self.container_name)?;

        if self.max_delivery_attempts == 0 {
            return Err(ConfigError::InvalidNumber {
                name: "MAX_DELIVERY_ATTEMPTS",
                value: "0".to_string(),
            });
        }
        if self.dead_letter_queue == self.queue_name {
            return Err(ConfigError::DeadLetterIsQueue(self.queue_name.clone()));
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

fn check_identifier(name: &'static str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            name,
            value: value.to_string(),
        })
    }
}
