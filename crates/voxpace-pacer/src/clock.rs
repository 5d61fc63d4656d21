use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Time source and sleeper used by the pacer.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time through the tokio timer (pausable in tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock that only moves when told to.
///
/// `sleep` advances it by the requested duration and returns immediately;
/// every `now` call advances it by a fixed `step` afterwards, which models
/// work done between two readings.
pub struct ManualClock {
    now: Mutex<Instant>,
    step: Duration,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self::with_step(start, Duration::ZERO)
    }

    pub fn with_step(start: Instant, step: Duration) -> Self {
        Self {
            now: Mutex::new(start),
            step,
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let current = *now;
        *now += self.step;
        current
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}

/// Outcome of comparing the pacing deadline with the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// The deadline is in the future; sleep this long.
    Sleep(Duration),
    /// The deadline has passed (or is now) by this much; do not sleep.
    Behind(Duration),
}

impl Wait {
    /// Signed wait in seconds; negative when behind schedule.
    pub fn as_secs_f64(&self) -> f64 {
        match self {
            Wait::Sleep(d) => d.as_secs_f64(),
            Wait::Behind(d) => -d.as_secs_f64(),
        }
    }

    pub fn sleep_duration(&self) -> Option<Duration> {
        match self {
            Wait::Sleep(d) => Some(*d),
            Wait::Behind(_) => None,
        }
    }
}

/// `start + elapsed_audio - now`, never a negative sleep.
pub fn compute_wait(start: Instant, elapsed_audio: Duration, now: Instant) -> Wait {
    let deadline = start + elapsed_audio;
    match deadline.checked_duration_since(now) {
        Some(ahead) if !ahead.is_zero() => Wait::Sleep(ahead),
        _ => Wait::Behind(now.saturating_duration_since(deadline)),
    }
}
