//! Metrics collection backed by the `sysinfo` crate.

use std::sync::Mutex;

use protocol::{DiskUsage, SystemSnapshot};
use sysinfo::{Disks, System};

use super::{format_gib, format_percent, MetricsError, MetricsProvider};

/// Collects CPU, memory and disk figures from the host.
///
/// CPU usage is measured between consecutive snapshots, so the provider keeps
/// one `System` alive for the life of the process. The constructor takes the
/// priming sample.
pub struct SysinfoProvider {
    system: Mutex<System>,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for SysinfoProvider {
    fn snapshot(&self) -> Result<SystemSnapshot, MetricsError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| MetricsError::Unavailable("system state lock poisoned".to_string()))?;

        system.refresh_cpu_usage();
        system.refresh_memory();

        let total_memory = system.total_memory();
        if total_memory == 0 {
            return Err(MetricsError::Collection {
                what: "memory",
                reason: "total memory reported as zero".to_string(),
            });
        }
        let used_memory = total_memory.saturating_sub(system.available_memory());

        let cpus = system.cpus();
        let cpu = cpus
            .first()
            .map(|c| format!("{} {}", c.vendor_id(), c.brand()).trim().to_string())
            .unwrap_or_else(|| "Unknown CPU".to_string());
        let cpu_cores: Vec<String> = cpus.iter().map(|c| format_percent(c.cpu_usage())).collect();
        let cpu_usage = if cpus.is_empty() {
            None
        } else {
            Some(format_percent(system.global_cpu_usage()))
        };

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .map(|d| {
                let size = d.total_space();
                DiskUsage {
                    fs: d.name().to_string_lossy().to_string(),
                    size: format_gib(size),
                    used: format_gib(size.saturating_sub(d.available_space())),
                }
            })
            .collect();

        Ok(SystemSnapshot {
            cpu,
            cores: cpus.len(),
            ram_total: format_gib(total_memory),
            ram_used: format_gib(used_memory),
            disk,
            cpu_usage,
            cpu_cores,
        })
    }
}
