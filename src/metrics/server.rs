use actix_web::{web, HttpResponse, Responder};

use super::Metrics;

/// GET /metrics
pub async fn metrics_handler(metrics: web::Data<Metrics>) -> impl Responder {
    match metrics.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
