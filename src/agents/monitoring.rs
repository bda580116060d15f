use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::state::{ConversationState, RouteDecision};
use super::{Agent, AgentReply};
use crate::core::error::SmartCloudError;
use crate::metrics::{MetricsProvider, MetricsSnapshot};

pub const RAM_ALERT_SUFFIX: &str =
    " ⚠️ ALERT: RAM usage is critically high. Close unused applications or free memory soon.";

/// Reports fresh CPU and RAM utilisation.
pub struct MonitoringAgent {
    metrics: Arc<dyn MetricsProvider>,
    ram_alert_threshold: f32,
}

impl MonitoringAgent {
    pub fn new(metrics: Arc<dyn MetricsProvider>, ram_alert_threshold: f32) -> Self {
        Self {
            metrics,
            ram_alert_threshold,
        }
    }
}

pub fn format_metrics(snapshot: MetricsSnapshot, ram_alert_threshold: f32) -> String {
    let mut text = format!(
        "Your CPU is at {:.1}% and RAM is {:.1}%.",
        snapshot.cpu_percent, snapshot.ram_percent
    );
    if snapshot.ram_percent > ram_alert_threshold {
        text.push_str(RAM_ALERT_SUFFIX);
    }
    text
}

#[async_trait]
impl Agent for MonitoringAgent {
    fn route(&self) -> RouteDecision {
        RouteDecision::Monitoring
    }

    fn label(&self) -> &'static str {
        "Monitoring Agent"
    }

    async fn run(&self, _state: &ConversationState) -> Result<AgentReply, SmartCloudError> {
        info!("fetching metrics");
        match self.metrics.snapshot().await {
            Ok(snapshot) => Ok(AgentReply::text(format_metrics(
                snapshot,
                self.ram_alert_threshold,
            ))),
            Err(e) => {
                warn!(error = %e, "metrics unavailable");
                Ok(AgentReply::text(format!(
                    "System metrics are unavailable right now ({}).",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMetrics {
        cpu: f32,
        ram: Option<f32>,
    }

    #[async_trait]
    impl MetricsProvider for FixedMetrics {
        async fn cpu_percent(&self) -> Result<f32, SmartCloudError> {
            Ok(self.cpu)
        }

        async fn memory_percent(&self) -> Result<f32, SmartCloudError> {
            self.ram
                .ok_or_else(|| SmartCloudError::Metrics("/proc/meminfo missing".to_string()))
        }
    }

    fn agent(cpu: f32, ram: Option<f32>) -> MonitoringAgent {
        MonitoringAgent::new(Arc::new(FixedMetrics { cpu, ram }), 90.0)
    }

    #[tokio::test]
    async fn high_ram_carries_alert() {
        let reply = agent(20.0, Some(95.0))
            .run(&ConversationState::default())
            .await
            .unwrap();
        assert!(reply.text.contains("RAM is 95.0%"));
        assert!(reply.text.ends_with(RAM_ALERT_SUFFIX));
    }

    #[tokio::test]
    async fn normal_ram_has_no_alert() {
        let reply = agent(20.0, Some(50.0))
            .run(&ConversationState::default())
            .await
            .unwrap();
        assert_eq!(reply.text, "Your CPU is at 20.0% and RAM is 50.0%.");
        assert!(!reply.text.contains(RAM_ALERT_SUFFIX));
    }

    #[test]
    fn threshold_is_exclusive() {
        let at_threshold = MetricsSnapshot {
            cpu_percent: 1.0,
            ram_percent: 90.0,
        };
        assert!(!format_metrics(at_threshold, 90.0).contains(RAM_ALERT_SUFFIX));
    }

    #[tokio::test]
    async fn sampling_failure_degrades_instead_of_failing() {
        let reply = agent(20.0, None)
            .run(&ConversationState::default())
            .await
            .unwrap();
        assert!(reply.text.starts_with("System metrics are unavailable"));
        assert!(reply.suggested_command.is_none());
    }
}
