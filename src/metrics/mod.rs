// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

pub use server::metrics_handler;

// ============================================================================
// Metrics Module - Prometheus metrics for the order pipeline
// ============================================================================
//
// Provides metrics for:
// - Producer runs and per-order sends
// - Consumer saves, failures by reason, and processing latency
// - Redeliveries and dead-lettered messages
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Producer
    pub producer_runs: IntCounterVec,
    pub orders_sent: IntCounter,
    pub orders_send_failed: IntCounter,

    // Consumer
    pub orders_saved: IntCounter,
    pub orders_save_failed: IntCounterVec,
    pub processing_duration: HistogramVec,

    // Delivery
    pub orders_redelivered: IntCounter,
    pub dlq_messages_total: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let producer_runs = IntCounterVec::new(
            Opts::new("producer_runs_total", "Producer pipeline invocations"),
            &["outcome"],
        )?;
        registry.register(Box::new(producer_runs.clone()))?;

        let orders_sent = IntCounter::new("orders_sent_total", "Orders published to the queue")?;
        registry.register(Box::new(orders_sent.clone()))?;

        let orders_send_failed = IntCounter::new(
            "orders_send_failed_total",
            "Orders that failed to publish",
        )?;
        registry.register(Box::new(orders_send_failed.clone()))?;

        let orders_saved = IntCounter::new("orders_saved_total", "Orders persisted to the store")?;
        registry.register(Box::new(orders_saved.clone()))?;

        let orders_save_failed = IntCounterVec::new(
            Opts::new("orders_save_failed_total", "Order messages that failed processing"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_save_failed.clone()))?;

        let processing_duration = HistogramVec::new(
            HistogramOpts::new(
                "order_processing_duration_seconds",
                "Time from message receipt to save outcome",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(processing_duration.clone()))?;

        let orders_redelivered = IntCounter::new(
            "orders_redelivered_total",
            "Order messages scheduled for redelivery",
        )?;
        registry.register(Box::new(orders_redelivered.clone()))?;

        let dlq_messages_total = IntCounter::new(
            "dlq_messages_total",
            "Messages moved to the dead-letter topic",
        )?;
        registry.register(Box::new(dlq_messages_total.clone()))?;

        Ok(Self {
            registry,
            producer_runs,
            orders_sent,
            orders_send_failed,
            orders_saved,
            orders_save_failed,
            processing_duration,
            orders_redelivered,
            dlq_messages_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_producer_run(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.producer_runs.with_label_values(&[outcome]).inc();
    }

    pub fn record_send(&self, success: bool) {
        if success {
            self.orders_sent.inc();
        } else {
            self.orders_send_failed.inc();
        }
    }

    /// `failure` is None on success, otherwise a short reason label
    pub fn record_save(&self, failure: Option<&str>, duration_secs: f64) {
        match failure {
            None => {
                self.orders_saved.inc();
                self.processing_duration.with_label_values(&["saved"]).observe(duration_secs);
            }
            Some(reason) => {
                self.orders_save_failed.with_label_values(&[reason]).inc();
                self.processing_duration.with_label_values(&["failed"]).observe(duration_secs);
            }
        }
    }

    pub fn record_redelivery(&self) {
        self.orders_redelivered.inc();
    }

    pub fn record_dlq_message(&self) {
        self.dlq_messages_total.inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        use prometheus::{Encoder, TextEncoder};

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
