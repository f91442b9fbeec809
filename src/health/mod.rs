use chrono::{DateTime, Utc};
use serde_json::json;

mod monitor;

pub use monitor::{health_handler, HealthMonitorActor, UpdateHealth};

// ============================================================================
// Health Status
// ============================================================================

/// Health status of a component
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => Some(reason),
        }
    }
}

/// Health information for a component
#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    pub details: Option<String>,
}

impl ComponentHealth {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "status": self.status.label(),
            "reason": self.status.reason(),
            "details": self.details,
            "last_check": self.last_check.to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(HealthStatus::Healthy.label(), "healthy");
        assert_eq!(HealthStatus::Degraded("slow".into()).label(), "degraded");
        assert_eq!(HealthStatus::Unhealthy("down".into()).reason(), Some("down"));
        assert!(HealthStatus::Unhealthy("down".into()).is_unhealthy());
        assert!(!HealthStatus::Degraded("slow".into()).is_unhealthy());
    }

    #[test]
    fn test_component_json() {
        let component = ComponentHealth {
            name: "store".to_string(),
            status: HealthStatus::Degraded("timeout".to_string()),
            last_check: Utc::now(),
            details: None,
        };

        let json = component.to_json();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["reason"], "timeout");
        assert!(json["details"].is_null());
    }
}
