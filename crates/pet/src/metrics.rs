//! The pet's view of system metrics: a sample, or the reason there is none.

use std::time::Duration;

/// Errors from a metrics read. Never fatal to the pet.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics unavailable: {0}")]
    Unavailable(String),
    #[error("metrics read timed out after {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One CPU/memory reading. Percentages are in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
}

impl SystemSample {
    /// A sample carrying only percentages.
    pub fn percentages(cpu_percent: f64, memory_percent: f64) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            memory_used_bytes: 0,
            memory_total_bytes: 0,
        }
    }

    /// Rejects non-finite readings and clamps the rest into `[0, 100]`.
    pub fn validated(self) -> Result<Self, MetricsError> {
        if !self.cpu_percent.is_finite() || !self.memory_percent.is_finite() {
            return Err(MetricsError::Unavailable(format!(
                "non-finite sample (cpu={}, mem={})",
                self.cpu_percent, self.memory_percent
            )));
        }
        Ok(Self {
            cpu_percent: self.cpu_percent.clamp(0.0, 100.0),
            memory_percent: self.memory_percent.clamp(0.0, 100.0),
            ..self
        })
    }
}
