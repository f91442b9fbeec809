use actix_web::{web, HttpResponse, Responder};

use crate::gateway::OrderGateway;
use crate::health::health_handler;
use crate::metrics::metrics_handler;
use crate::pipeline::SendOrders;

// ============================================================================
// HTTP surface
// ============================================================================
//
// GET /api/SendOrders  anonymous producer trigger: empty 200 or empty 500
// GET /metrics         Prometheus text format
// GET /health          aggregated component health
//
// ============================================================================

/// Runs one producer batch. Per-order status is never surfaced.
pub async fn send_orders_handler<G>(producer: web::Data<SendOrders<G>>) -> impl Responder
where
    G: OrderGateway + 'static,
{
    match producer.run().await {
        Ok(sent) => {
            tracing::info!(sent = sent, "SendOrders completed");
            HttpResponse::Ok().finish()
        }
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

pub fn configure<G>(cfg: &mut web::ServiceConfig)
where
    G: OrderGateway + 'static,
{
    cfg.route("/api/SendOrders", web::get().to(send_orders_handler::<G>))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OrderStoreGateway;
    use crate::metrics::Metrics;
    use crate::testing::{InMemoryOrderStore, InMemoryQueue};
    use actix_web::{body::to_bytes, http::StatusCode, test, App};
    use std::sync::Arc;

    type TestGateway = OrderStoreGateway<InMemoryQueue, InMemoryOrderStore>;

    fn producer(queue: Arc<InMemoryQueue>, metrics: Arc<Metrics>) -> web::Data<SendOrders<TestGateway>> {
        let store = Arc::new(InMemoryOrderStore::new());
        let gateway = Arc::new(OrderStoreGateway::new(queue, store, "orders"));
        web::Data::new(SendOrders::new(gateway, metrics))
    }

    #[actix_web::test]
    async fn test_send_orders_returns_empty_ok() {
        let queue = Arc::new(InMemoryQueue::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = test::init_service(
            App::new()
                .app_data(producer(queue.clone(), metrics))
                .route("/api/SendOrders", web::get().to(send_orders_handler::<TestGateway>)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/SendOrders").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(queue.published().len(), 100);
    }

    #[actix_web::test]
    async fn test_send_orders_maps_failure_to_500() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.fail_on_publish(50);
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = test::init_service(
            App::new()
                .app_data(producer(queue.clone(), metrics))
                .route("/api/SendOrders", web::get().to(send_orders_handler::<TestGateway>)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/SendOrders").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(queue.published().len(), 49);
    }

    #[actix_web::test]
    async fn test_metrics_endpoint() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.record_send(true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(metrics))
                .route("/metrics", web::get().to(metrics_handler)),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("orders_sent_total 1"));
    }
}
