//! Health reporting for AppContext components

use chrono::Utc;
use serde::Serialize;

/// Share of healthy components at or above which the process counts as healthy
const HEALTHY_THRESHOLD: f64 = 0.8;

/// Overall health of the running process
///
/// # Example
/// ```
/// use deskpulse_lib::utils::health::{ComponentHealth, HealthStatus};
///
/// let mut status = HealthStatus::new()
///     .add_component(ComponentHealth::healthy("ingestion"))
///     .add_component(ComponentHealth::unhealthy("capture", "hooks not installed"));
/// status.calculate_score();
///
/// assert_eq!(status.score, 0.5);
/// assert!(!status.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub is_healthy: bool,

    /// `healthy_components / total_components`, 1.0 with no components
    pub score: f64,

    pub components: Vec<ComponentHealth>,

    /// Unix seconds when the check ran
    pub timestamp: i64,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self { is_healthy: true, score: 1.0, components: Vec::new(), timestamp: Utc::now().timestamp() }
    }

    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy` from the components.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy_count = self.components.iter().filter(|c| c.is_healthy).count();
        self.score = healthy_count as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
    }

    /// Look up a component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.components.iter().find(|c| c.name == name)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Health of a single component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    /// Component identifier, e.g. "capture" or "ingestion"
    pub name: String,
    pub is_healthy: bool,
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }

    /// A component switched off in configuration. Counts as healthy.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: Some("disabled".to_string()) }
    }
}
