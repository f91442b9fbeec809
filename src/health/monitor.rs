use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::reply::{Reply, ReplyError};
use kameo::Actor;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{ComponentHealth, HealthStatus};
use crate::db::ScyllaOrderStore;

// ============================================================================
// Health Monitor Actor - aggregates component health
// ============================================================================
//
// Components (broker, store, consumer) report their status with UpdateHealth.
// When a store handle is given, the store is also probed periodically.
//
// ============================================================================

const STORE_PROBE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct GetSystemHealth;

#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: chrono::DateTime<Utc>,
}

impl SystemHealth {
    pub fn to_json(&self) -> serde_json::Value {
        let components: serde_json::Map<String, serde_json::Value> = self
            .components
            .iter()
            .map(|(name, health)| (name.clone(), health.to_json()))
            .collect();

        json!({
            "status": self.overall_status.label(),
            "reason": self.overall_status.reason(),
            "service": "order-pipeline",
            "components": components,
            "check_time": self.check_time.to_rfc3339(),
        })
    }
}

impl Reply for SystemHealth {
    type Ok = Self;
    type Error = Infallible;
    type Value = Self;

    fn to_result(self) -> Result<Self, Infallible> {
        Ok(self)
    }

    fn into_any_err(self) -> Option<Box<dyn ReplyError>> {
        None
    }

    fn into_value(self) -> Self::Value {
        self
    }
}

#[derive(Default)]
pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    store: Option<Arc<ScyllaOrderStore>>,
}

impl HealthMonitorActor {
    pub fn new(store: Arc<ScyllaOrderStore>) -> Self {
        Self {
            components: HashMap::new(),
            store: Some(store),
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy_components.is_empty() {
            unhealthy_components.sort();
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Actor for HealthMonitorActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!("HealthMonitorActor started");

        if let Some(store) = state.store.clone() {
            let actor_ref = actor_ref.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(STORE_PROBE_INTERVAL);
                loop {
                    interval.tick().await;

                    let status = match store.ping().await {
                        Ok(()) => HealthStatus::Healthy,
                        Err(e) => HealthStatus::Unhealthy(e.to_string()),
                    };

                    let sent = actor_ref
                        .tell(UpdateHealth {
                            component: "store".to_string(),
                            status,
                            details: None,
                        })
                        .send()
                        .await;
                    if sent.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(state)
    }
}

impl Message<UpdateHealth> for HealthMonitorActor {
    type Reply = ();

    async fn handle(&mut self, msg: UpdateHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let health = ComponentHealth {
            name: msg.component.clone(),
            status: msg.status.clone(),
            last_check: Utc::now(),
            details: msg.details,
        };

        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "Updated component health"
        );

        self.components.insert(msg.component, health);
    }
}

impl Message<GetSystemHealth> for HealthMonitorActor {
    type Reply = SystemHealth;

    async fn handle(&mut self, _msg: GetSystemHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        }
    }
}

/// GET /health
pub async fn health_handler(monitor: web::Data<ActorRef<HealthMonitorActor>>) -> impl Responder {
    match monitor.ask(GetSystemHealth).send().await {
        Ok(health) if health.overall_status.is_unhealthy() => {
            HttpResponse::ServiceUnavailable().json(health.to_json())
        }
        Ok(health) => HttpResponse::Ok().json(health.to_json()),
        Err(e) => {
            tracing::error!(error = ?e, "Health monitor unavailable");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unhealthy",
                "service": "order-pipeline",
                "reason": "health monitor unavailable",
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, status: HealthStatus) -> ComponentHealth {
        ComponentHealth {
            name: name.to_string(),
            status,
            last_check: Utc::now(),
            details: None,
        }
    }

    #[test]
    fn test_overall_healthy_when_empty() {
        let monitor = HealthMonitorActor::default();
        assert_eq!(monitor.compute_overall_status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_overall_degraded() {
        let mut monitor = HealthMonitorActor::default();
        monitor.components.insert("store".into(), component("store", HealthStatus::Healthy));
        monitor
            .components
            .insert("broker".into(), component("broker", HealthStatus::Degraded("lag".into())));

        assert!(matches!(monitor.compute_overall_status(), HealthStatus::Degraded(_)));
    }

    #[test]
    fn test_overall_unhealthy_lists_components() {
        let mut monitor = HealthMonitorActor::default();
        monitor
            .components
            .insert("store".into(), component("store", HealthStatus::Unhealthy("down".into())));
        monitor
            .components
            .insert("broker".into(), component("broker", HealthStatus::Degraded("lag".into())));

        assert_eq!(
            monitor.compute_overall_status(),
            HealthStatus::Unhealthy("store: down".to_string())
        );
    }

    #[tokio::test]
    async fn test_actor_tracks_reported_health() {
        let monitor = HealthMonitorActor::spawn(HealthMonitorActor::default());

        let told = monitor
            .tell(UpdateHealth {
                component: "consumer".to_string(),
                status: HealthStatus::Unhealthy("stream ended".to_string()),
                details: Some("order queue".to_string()),
            })
            .send()
            .await;
        assert!(told.is_ok());

        let Ok(health) = monitor.ask(GetSystemHealth).send().await else {
            panic!("health monitor did not reply");
        };
        assert!(health.overall_status.is_unhealthy());
        assert_eq!(health.components["consumer"].details.as_deref(), Some("order queue"));
        assert_eq!(health.to_json()["components"]["consumer"]["status"], "unhealthy");
    }
}
