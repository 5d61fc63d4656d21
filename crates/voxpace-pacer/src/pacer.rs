use crate::clock::{compute_wait, Clock, TokioClock, Wait};
use crate::schedule::DelaySchedule;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use voxpace_audio::ChunkSource;
use voxpace_core::{AudioFormat, PaceError};
use voxpace_session::ChunkSink;

/// How much audio time each sent chunk accounts for.
#[derive(Debug, Clone, PartialEq)]
pub enum PacingMode {
    /// Derive the time from the chunk length, as if captured live.
    Realtime(AudioFormat),
    /// Take the time from an explicit per-chunk schedule.
    Schedule(DelaySchedule),
}

impl PacingMode {
    /// Reject a real-time format that carries no audio time per byte.
    pub fn validate(&self) -> Result<(), PaceError> {
        match self {
            PacingMode::Realtime(format) if format.bytes_per_second() == 0 => {
                Err(PaceError::InvalidFormat(format!(
                    "{} bytes/sample x {} Hz x {} channel(s) is zero bytes per second",
                    format.bytes_per_sample, format.sample_rate_hz, format.channels
                )))
            }
            _ => Ok(()),
        }
    }

    fn audio_secs(&self, index: usize, len: usize) -> Result<f64, PaceError> {
        match self {
            PacingMode::Realtime(format) => Ok(format.duration_secs(len)),
            PacingMode::Schedule(schedule) => schedule.delay_secs(index),
        }
    }
}

/// Start time plus accumulated audio time for a single run.
#[derive(Debug, Clone, Default)]
pub struct PacingClock {
    start_time: Option<Instant>,
    elapsed_audio_secs: f64,
}

impl PacingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start time. Later calls are ignored.
    pub fn start(&mut self, now: Instant) {
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    pub fn elapsed_audio_secs(&self) -> f64 {
        self.elapsed_audio_secs
    }

    pub fn advance(&mut self, secs: f64) {
        debug_assert!(secs >= 0.0);
        self.elapsed_audio_secs += secs;
    }

    pub fn wait(&self, now: Instant) -> Wait {
        let start = self.start_time.unwrap_or(now);
        compute_wait(start, Duration::from_secs_f64(self.elapsed_audio_secs), now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTiming {
    pub index: usize,
    pub len: usize,
    /// Audio clock after this chunk was accounted for.
    pub elapsed_audio_secs: f64,
    pub wait: Wait,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacingReport {
    pub chunks: Vec<ChunkTiming>,
}

impl PacingReport {
    pub fn chunks_sent(&self) -> usize {
        self.chunks.len()
    }

    pub fn bytes_sent(&self) -> usize {
        self.chunks.iter().map(|c| c.len).sum()
    }

    pub fn elapsed_audio_secs(&self) -> f64 {
        self.chunks.last().map(|c| c.elapsed_audio_secs).unwrap_or(0.0)
    }

    /// Signed waits in seconds, one per chunk.
    pub fn waits(&self) -> Vec<f64> {
        self.chunks.iter().map(|c| c.wait.as_secs_f64()).collect()
    }
}

/// Forwards chunks from a source to a sink at real-time cadence.
///
/// All per-run state (clock start, audio time, schedule position) lives in
/// [`Pacer::run`], so a single pacer can be run repeatedly.
pub struct Pacer {
    mode: PacingMode,
    clock: Arc<dyn Clock>,
}

impl Pacer {
    pub fn new(mode: PacingMode) -> Self {
        Self::with_clock(mode, Arc::new(TokioClock))
    }

    pub fn with_clock(mode: PacingMode, clock: Arc<dyn Clock>) -> Self {
        Self { mode, clock }
    }

    pub fn mode(&self) -> &PacingMode {
        &self.mode
    }

    /// Send every chunk of `source` to `sink`, then signal end of input once.
    ///
    /// A source error or a rejected send stops the run immediately; no
    /// further chunk and no end of input is sent in that case. A zero
    /// real-time format fails before the source is read.
    pub async fn run(
        &self,
        source: &mut dyn ChunkSource,
        sink: &mut dyn ChunkSink,
    ) -> Result<PacingReport, PaceError> {
        self.mode.validate()?;
        let mut pacing = PacingClock::new();
        let mut report = PacingReport::default();
        let mut index = 0usize;

        loop {
            let chunk = match source.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(source) => return Err(PaceError::Source { index, source }),
            };

            // Exhausted schedule is checked before the unpaced chunk goes out.
            let audio_secs = self.mode.audio_secs(index, chunk.len())?;

            if !pacing.is_started() {
                pacing.start(self.clock.now());
            }

            let len = chunk.len();
            sink.send_chunk(chunk)
                .await
                .map_err(|source| PaceError::Send { index, source })?;

            pacing.advance(audio_secs);
            let wait = pacing.wait(self.clock.now());
            tracing::debug!(
                chunk = index,
                len,
                wait_secs = wait.as_secs_f64(),
                "chunk sent"
            );
            if let Some(duration) = wait.sleep_duration() {
                self.clock.sleep(duration).await;
            }

            report.chunks.push(ChunkTiming {
                index,
                len,
                elapsed_audio_secs: pacing.elapsed_audio_secs(),
                wait,
            });
            index += 1;
        }

        sink.end_of_input().await.map_err(PaceError::EndOfInput)?;
        tracing::info!(
            chunks = report.chunks_sent(),
            bytes = report.bytes_sent(),
            audio_secs = report.elapsed_audio_secs(),
            "done streaming"
        );
        Ok(report)
    }
}
