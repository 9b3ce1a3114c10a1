use serde::Serialize;

use crate::sampler::ResourceGauges;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Running,
    Stopped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Blank when the source block carried no name marker; consumers must
    /// tolerate unnamed records.
    pub name: String,
    pub state: ServiceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

/// One complete snapshot of the observed services. Built fresh on every poll
/// cycle and replaced wholesale; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub services: Vec<ServiceRecord>,
    pub running: usize,
    pub stopped: usize,
    pub failed: usize,
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
}

impl Inventory {
    pub fn new(services: Vec<ServiceRecord>, gauges: ResourceGauges) -> Self {
        let running = count_state(&services, ServiceState::Running);
        let stopped = count_state(&services, ServiceState::Stopped);
        let failed = count_state(&services, ServiceState::Failed);

        Self {
            services,
            running,
            stopped,
            failed,
            cpu_usage_percent: gauges.cpu_usage_percent,
            memory_usage_percent: gauges.memory_usage_percent,
        }
    }
}

fn count_state(services: &[ServiceRecord], state: ServiceState) -> usize {
    services
        .iter()
        .filter(|record| record.state == state)
        .count()
}
