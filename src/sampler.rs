//! Host resource gauges attached to each inventory snapshot

use std::sync::Mutex;

use sysinfo::System;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceGauges {
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
}

pub trait ResourceSampler: Send + Sync {
    fn sample(&self) -> ResourceGauges;
}

pub struct SystemSampler {
    system: Mutex<System>,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SystemSampler {
    fn sample(&self) -> ResourceGauges {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        system.refresh_cpu_usage();
        system.refresh_memory();

        let total = system.total_memory();
        let memory_usage_percent = if total == 0 {
            0.0
        } else {
            system.used_memory() as f64 / total as f64 * 100.0
        };

        ResourceGauges {
            cpu_usage_percent: f64::from(system.global_cpu_usage()),
            memory_usage_percent,
        }
    }
}
