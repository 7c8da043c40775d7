//! Where system metrics come from.
//!
//! The keeper only sees the [`MetricsSource`] trait. [`ProcMetrics`] reads the
//! Linux procfs; [`FixedMetrics`] replays a canned answer and backs the tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pet::{MetricsError, SystemSample};
use tokio::sync::Mutex;

/// A provider of CPU and memory readings.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Takes one reading. Failures are reported, never panicked on.
    async fn sample(&self) -> Result<SystemSample, MetricsError>;
}

/// Cumulative jiffies from the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    /// Busy share between `earlier` and `self`, in percent.
    ///
    /// Returns `None` when no jiffies elapsed.
    pub fn percent_since(&self, earlier: &CpuTimes) -> Option<f64> {
        let total = self.total.checked_sub(earlier.total)?;
        if total == 0 {
            return None;
        }
        let busy = self.busy.saturating_sub(earlier.busy);
        Some(busy as f64 / total as f64 * 100.0)
    }
}

/// Parses the aggregate `cpu` line.
///
/// Fields are `user nice system idle iowait irq softirq steal [guest guest_nice]`.
/// Guest time is already folded into `user`/`nice` and is not counted twice.
pub fn parse_proc_stat(text: &str) -> Result<CpuTimes, MetricsError> {
    let line = text
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| MetricsError::Unavailable("no aggregate cpu line".into()))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|e| MetricsError::Unavailable(format!("bad cpu field: {e}")))?;

    if fields.len() < 4 {
        return Err(MetricsError::Unavailable(format!(
            "cpu line has {} fields",
            fields.len()
        )));
    }

    let total: u64 = fields.iter().sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Ok(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}

/// Parses `MemTotal` and `MemAvailable` (kB) into `(used, total)` bytes.
pub fn parse_meminfo(text: &str) -> Result<(u64, u64), MetricsError> {
    let mut total = None;
    let mut available = None;
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let slot = match parts.next() {
            Some("MemTotal:") => &mut total,
            Some("MemAvailable:") => &mut available,
            _ => continue,
        };
        *slot = parts.next().and_then(|v| v.parse::<u64>().ok());
    }

    match (total, available) {
        (Some(total), Some(available)) if total > 0 => {
            let used = total.saturating_sub(available);
            Ok((used * 1024, total * 1024))
        }
        _ => Err(MetricsError::Unavailable(
            "MemTotal/MemAvailable missing".into(),
        )),
    }
}

/// Reads `<root>/stat` and `<root>/meminfo`.
///
/// CPU load is the busy share since the previous call. The first call has no
/// baseline and reports the average since boot.
#[derive(Debug)]
pub struct ProcMetrics {
    root: PathBuf,
    previous: Mutex<Option<CpuTimes>>,
}

impl Default for ProcMetrics {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcMetrics {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            previous: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MetricsSource for ProcMetrics {
    async fn sample(&self) -> Result<SystemSample, MetricsError> {
        let stat = tokio::fs::read_to_string(self.root.join("stat")).await?;
        let meminfo = tokio::fs::read_to_string(self.root.join("meminfo")).await?;

        let now = parse_proc_stat(&stat)?;
        let (used, total) = parse_meminfo(&meminfo)?;

        let mut previous = self.previous.lock().await;
        let baseline = previous.unwrap_or(CpuTimes { busy: 0, total: 0 });
        let cpu = now.percent_since(&baseline).unwrap_or(0.0);
        *previous = Some(now);

        Ok(SystemSample {
            cpu_percent: cpu,
            memory_percent: used as f64 / total as f64 * 100.0,
            memory_used_bytes: used,
            memory_total_bytes: total,
        })
    }
}

/// Answers every read with the same outcome.
#[derive(Debug, Clone)]
pub enum FixedMetrics {
    Sample(SystemSample),
    Unavailable(String),
}

impl FixedMetrics {
    pub fn percentages(cpu: f64, memory: f64) -> Self {
        Self::Sample(SystemSample::percentages(cpu, memory))
    }
}

#[async_trait]
impl MetricsSource for FixedMetrics {
    async fn sample(&self) -> Result<SystemSample, MetricsError> {
        match self {
            Self::Sample(s) => Ok(*s),
            Self::Unavailable(reason) => Err(MetricsError::Unavailable(reason.clone())),
        }
    }
}
