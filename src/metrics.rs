//! Host CPU and memory utilisation.
//!
//! `ProcMetrics` reads the Linux procfs directly: CPU usage is the busy share of
//! jiffies between two `/proc/stat` samples, memory usage is
//! `1 - MemAvailable / MemTotal` from `/proc/meminfo`.

use crate::core::error::SmartCloudError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Ephemeral utilisation reading. Never persisted with the conversation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub cpu_percent: f32,
    pub ram_percent: f32,
}

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn cpu_percent(&self) -> Result<f32, SmartCloudError>;

    async fn memory_percent(&self) -> Result<f32, SmartCloudError>;

    /// Two independent reads; not an atomic snapshot.
    async fn snapshot(&self) -> Result<MetricsSnapshot, SmartCloudError> {
        let cpu_percent = self.cpu_percent().await?;
        let ram_percent = self.memory_percent().await?;
        Ok(MetricsSnapshot {
            cpu_percent,
            ram_percent,
        })
    }
}

pub struct ProcMetrics {
    proc_root: PathBuf,
    sample_interval: Duration,
}

impl ProcMetrics {
    pub fn new(sample_interval: Duration) -> Self {
        Self::with_root("/proc", sample_interval)
    }

    pub fn with_root(proc_root: impl Into<PathBuf>, sample_interval: Duration) -> Self {
        Self {
            proc_root: proc_root.into(),
            sample_interval,
        }
    }

    async fn read(&self, name: &str) -> Result<String, SmartCloudError> {
        let path = self.proc_root.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SmartCloudError::Metrics(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl MetricsProvider for ProcMetrics {
    async fn cpu_percent(&self) -> Result<f32, SmartCloudError> {
        let first = parse_cpu_times(&self.read("stat").await?)?;
        tokio::time::sleep(self.sample_interval).await;
        let second = parse_cpu_times(&self.read("stat").await?)?;
        Ok(cpu_usage_between(first, second))
    }

    async fn memory_percent(&self) -> Result<f32, SmartCloudError> {
        parse_memory_percent(&self.read("meminfo").await?)
    }
}

/// Aggregate jiffies from the `cpu ` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

pub fn parse_cpu_times(stat: &str) -> Result<CpuTimes, SmartCloudError> {
    let line = stat
        .lines()
        .find(|line| line.starts_with("cpu "))
        .ok_or_else(|| SmartCloudError::Metrics("no aggregate cpu line in /proc/stat".to_string()))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|e| SmartCloudError::Metrics(format!("bad /proc/stat field: {}", e)))?;

    if fields.len() < 4 {
        return Err(SmartCloudError::Metrics(format!(
            "expected at least 4 cpu fields, got {}",
            fields.len()
        )));
    }

    // user nice system idle iowait irq softirq steal [guest guest_nice]
    // guest time is already counted in user/nice.
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total = fields.iter().take(8).sum();
    Ok(CpuTimes { idle, total })
}

pub fn cpu_usage_between(first: CpuTimes, second: CpuTimes) -> f32 {
    let total = second.total.saturating_sub(first.total);
    if total == 0 {
        return 0.0;
    }
    let idle = second.idle.saturating_sub(first.idle).min(total);
    let busy = (total - idle) as f64 / total as f64 * 100.0;
    round_tenth(busy)
}

pub fn parse_memory_percent(meminfo: &str) -> Result<f32, SmartCloudError> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse().ok())
    };

    let total = field("MemTotal:")
        .filter(|t| *t > 0)
        .ok_or_else(|| SmartCloudError::Metrics("MemTotal missing from /proc/meminfo".to_string()))?;
    let available = field("MemAvailable:")
        .ok_or_else(|| SmartCloudError::Metrics("MemAvailable missing from /proc/meminfo".to_string()))?;

    let used = total.saturating_sub(available) as f64 / total as f64 * 100.0;
    Ok(round_tenth(used))
}

fn round_tenth(value: f64) -> f32 {
    ((value * 10.0).round() / 10.0).clamp(0.0, 100.0) as f32
}
