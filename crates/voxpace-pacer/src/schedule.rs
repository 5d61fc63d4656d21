use std::time::Duration;
use voxpace_core::{ConfigError, PaceError};

/// Explicit per-chunk delays in milliseconds, indexed by send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelaySchedule {
    delays_ms: Vec<u64>,
}

impl DelaySchedule {
    pub fn new(delays_ms: Vec<u64>) -> Self {
        Self { delays_ms }
    }

    /// Parse a comma-separated list such as `"142, 79, 1880"`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.trim().is_empty() {
            return Err(ConfigError::Invalid("delay schedule is empty".to_string()));
        }
        let delays_ms = s
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(position, part)| {
                if part.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "delay schedule entry {position} is empty"
                    )));
                }
                part.parse::<u64>().map_err(|e| {
                    ConfigError::Invalid(format!("bad delay schedule entry '{part}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { delays_ms })
    }

    pub fn to_millis(&self) -> Vec<u64> {
        self.delays_ms.clone()
    }

    pub fn len(&self) -> usize {
        self.delays_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays_ms.is_empty()
    }

    pub fn delay(&self, index: usize) -> Option<Duration> {
        self.delays_ms.get(index).map(|ms| Duration::from_millis(*ms))
    }

    /// Seconds to add to the audio clock for the `index`-th chunk.
    pub fn delay_secs(&self, index: usize) -> Result<f64, PaceError> {
        self.delays_ms
            .get(index)
            .map(|ms| *ms as f64 / 1000.0)
            .ok_or(PaceError::ScheduleExhausted {
                index,
                len: self.delays_ms.len(),
            })
    }
}
