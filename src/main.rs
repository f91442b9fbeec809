use actix_web::{web, App, HttpServer};
use kameo::Actor;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod db;
mod gateway;
mod health;
mod messaging;
mod metrics;
mod models;
mod pipeline;
#[cfg(test)]
mod testing;

use config::Config;
use db::ScyllaOrderStore;
use gateway::OrderStoreGateway;
use health::{HealthMonitorActor, HealthStatus, UpdateHealth};
use messaging::{ListenerSettings, QueueListener, RedpandaClient};
use pipeline::{SaveOrders, SendOrders, ORDER_BATCH_SIZE};

type ProductionGateway = OrderStoreGateway<RedpandaClient, ScyllaOrderStore>;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_pipeline=debug")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        queue = %config.queue_name,
        database = %config.database_name,
        container = %config.container_name,
        "🚀 Starting order pipeline"
    );

    // === 1. Shared store client ===
    tracing::info!(endpoint = %config.store_endpoint, "Connecting to ScyllaDB...");
    let session: Session = SessionBuilder::new()
        .known_node(&config.store_endpoint)
        .build()
        .await?;
    let store = Arc::new(
        ScyllaOrderStore::new(Arc::new(session), &config.database_name, &config.container_name).await?,
    );

    // === 2. Shared broker client ===
    let redpanda = Arc::new(RedpandaClient::new(&config.broker_endpoint)?);

    // === 3. Metrics and health ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());
    let health = HealthMonitorActor::spawn(HealthMonitorActor::new(store.clone()));

    let gateway: Arc<ProductionGateway> = Arc::new(OrderStoreGateway::new(
        redpanda.clone(),
        store.clone(),
        config.queue_name.clone(),
    ));

    // === 4. Consumer pipeline, one invocation per queued message ===
    let listener = QueueListener::new(
        ListenerSettings {
            brokers: config.broker_endpoint.clone(),
            consumer_group: config.consumer_group.clone(),
            topic: config.queue_name.clone(),
            dead_letter_topic: config.dead_letter_queue.clone(),
            max_delivery_attempts: config.max_delivery_attempts,
            redelivery_delay: config.redelivery_delay,
        },
        redpanda.clone(),
        metrics.clone(),
        Some(health.clone()),
    )?;
    let save_orders = Arc::new(SaveOrders::new(gateway.clone(), metrics.clone()));
    let consumer_health = health.clone();

    actix_web::rt::spawn(async move {
        let result = listener
            .run(|body| {
                let save_orders = save_orders.clone();
                async move { save_orders.run(&body).await.map(|_| ()) }
            })
            .await;

        let status = match result {
            Ok(()) => HealthStatus::Unhealthy("order queue stream ended".to_string()),
            Err(e) => {
                tracing::error!(error = %e, "Order consumer stopped");
                HealthStatus::Unhealthy(e.to_string())
            }
        };
        let _ = consumer_health
            .tell(UpdateHealth {
                component: "consumer".to_string(),
                status,
                details: None,
            })
            .send()
            .await;
    });

    // === 5. HTTP trigger for the producer pipeline ===
    let producer = web::Data::new(SendOrders::new(gateway, metrics.clone()));
    let metrics_data = web::Data::from(metrics);
    let health_data = web::Data::new(health);

    tracing::info!(
        port = config.http_port,
        batch_size = ORDER_BATCH_SIZE,
        "🌐 Serving GET /api/SendOrders, /metrics and /health"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(producer.clone())
            .app_data(metrics_data.clone())
            .app_data(health_data.clone())
            .configure(api::configure::<ProductionGateway>)
    })
    .bind(("0.0.0.0", config.http_port))?
    .run()
    .await?;

    tracing::info!("👋 Order pipeline stopped");
    Ok(())
}
