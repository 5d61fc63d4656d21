use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use voxpace_audio::ChunkSource;
use voxpace_core::RunError;
use voxpace_handler::{DrainReport, EventDrainer};
use voxpace_pacer::{Pacer, PacingReport};
use voxpace_session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub pacing: PacingReport,
    pub drain: DrainReport,
    pub wall_time: Duration,
}

/// Runs a pacer and an event drainer concurrently over one session.
///
/// The first task to fail aborts the other. With a deadline set, both are
/// aborted once it passes. Handlers are shut down on every path.
pub struct SessionRunner {
    pacer: Pacer,
    drainer: EventDrainer,
    deadline: Option<Duration>,
}

fn aborted(stage: &'static str, err: JoinError) -> RunError {
    RunError::TaskAborted {
        stage,
        message: err.to_string(),
    }
}

/// Abort a task and wait until it has stopped, unless it already finished.
async fn cancel<T>(task: &mut JoinHandle<T>) {
    if !task.is_finished() {
        task.abort();
        let _ = task.await;
    }
}

impl SessionRunner {
    pub fn new(pacer: Pacer, drainer: EventDrainer) -> Self {
        Self {
            pacer,
            drainer,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub async fn run(
        self,
        mut source: Box<dyn ChunkSource>,
        session: Session,
    ) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let (mut sink, mut stream) = session.into_split();
        let pacer = self.pacer;
        let drainer = Arc::new(self.drainer.with_session_start(started));
        let task_drainer = Arc::clone(&drainer);

        let mut pacing =
            tokio::spawn(async move { pacer.run(source.as_mut(), sink.as_mut()).await });
        let mut draining = tokio::spawn(async move { task_drainer.drain(stream.as_mut()).await });

        let both = async {
            let mut pacing_report: Option<PacingReport> = None;
            let mut drain_report: Option<DrainReport> = None;

            while pacing_report.is_none() || drain_report.is_none() {
                tokio::select! {
                    joined = &mut pacing, if pacing_report.is_none() => {
                        let failure = match joined {
                            Ok(Ok(report)) => {
                                tracing::debug!(
                                    chunks = report.chunks_sent(),
                                    "pacing task finished"
                                );
                                pacing_report = Some(report);
                                continue;
                            }
                            Ok(Err(e)) => RunError::Pacing(e),
                            Err(e) => aborted("pacing", e),
                        };
                        cancel(&mut draining).await;
                        return Err(failure);
                    }
                    joined = &mut draining, if drain_report.is_none() => {
                        let failure = match joined {
                            Ok(Ok(report)) => {
                                tracing::debug!(events = report.events, "draining task finished");
                                drain_report = Some(report);
                                continue;
                            }
                            Ok(Err(e)) => RunError::Draining(e),
                            Err(e) => aborted("draining", e),
                        };
                        cancel(&mut pacing).await;
                        return Err(failure);
                    }
                }
            }

            Ok::<_, RunError>((
                pacing_report.unwrap_or_default(),
                drain_report.unwrap_or_default(),
            ))
        };

        let outcome = match self.deadline {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, both).await;
                match timed {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        cancel(&mut pacing).await;
                        cancel(&mut draining).await;
                        Err(RunError::DeadlineExceeded(limit))
                    }
                }
            }
            None => both.await,
        };

        // Both tasks have stopped here, so handlers see no further lines.
        drainer.shutdown().await;

        match outcome {
            Ok((pacing, drain)) => {
                let summary = RunSummary {
                    pacing,
                    drain,
                    wall_time: started.elapsed(),
                };
                tracing::info!(
                    chunks = summary.pacing.chunks_sent(),
                    lines = summary.drain.lines,
                    wall_secs = summary.wall_time.as_secs_f64(),
                    "session complete"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("session failed: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use voxpace_audio::MemoryChunkSource;
    use std::sync::atomic::{AtomicBool, Ordering};
    use voxpace_core::{
        Alternative, AudioFormat, Chunk, DrainError, HandlerError, PaceError, SessionError,
        TranscriptEvent, TranscriptLine, TranscriptResult,
    };
    use voxpace_handler::ResultHandler;
    use voxpace_pacer::{DelaySchedule, PacingMode};
    use voxpace_session::{channel_session, SinkMessage};

    fn stereo_8k() -> AudioFormat {
        AudioFormat {
            bytes_per_sample: 2,
            sample_rate_hz: 8000,
            channels: 2,
        }
    }

    fn source(chunks: usize) -> Box<dyn ChunkSource> {
        Box::new(MemoryChunkSource::from_bytes(&vec![0u8; 3200 * chunks], 3200))
    }

    struct BrokenSource;

    #[async_trait]
    impl ChunkSource for BrokenSource {
        async fn next_chunk(&mut self) -> std::io::Result<Option<Chunk>> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "read failed"))
        }
    }

    /// Handler that can be told to fail and remembers whether it was shut down.
    struct FlagHandler {
        fail: bool,
        shut_down: Arc<AtomicBool>,
    }

    impl FlagHandler {
        fn new(fail: bool) -> (Self, Arc<AtomicBool>) {
            let shut_down = Arc::new(AtomicBool::new(false));
            let handler = Self {
                fail,
                shut_down: Arc::clone(&shut_down),
            };
            (handler, shut_down)
        }
    }

    #[async_trait]
    impl ResultHandler for FlagHandler {
        fn name(&self) -> &str {
            "flag"
        }

        async fn initialize(&mut self, _config: toml::Value) -> Result<(), HandlerError> {
            Ok(())
        }

        async fn handle(&self, _line: &TranscriptLine) -> Result<(), HandlerError> {
            if self.fail {
                return Err(HandlerError::WriteFailed("disk full".to_string()));
            }
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), HandlerError> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn one_result_event() -> TranscriptEvent {
        TranscriptEvent {
            results: vec![TranscriptResult {
                result_id: "r1".to_string(),
                start_time: 0.0,
                end_time: 0.1,
                is_partial: true,
                channel_id: None,
                alternatives: vec![Alternative {
                    transcript: "hello".to_string(),
                }],
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_both_tasks() {
        let (session, mut backend) = channel_session(8);
        // Endpoint: echo one final result per session once input ends
        tokio::spawn(async move {
            let mut chunks = 0;
            while let Some(message) = backend.inbound.recv().await {
                match message {
                    SinkMessage::Chunk(_) => chunks += 1,
                    SinkMessage::EndOfInput => break,
                }
            }
            let _ = backend
                .events
                .send(Ok(TranscriptEvent {
                    results: vec![TranscriptResult {
                        result_id: "final".to_string(),
                        start_time: 0.0,
                        end_time: 0.3,
                        is_partial: false,
                        channel_id: None,
                        alternatives: vec![Alternative {
                            transcript: format!("{chunks} chunks"),
                        }],
                    }],
                }))
                .await;
        });

        let runner = SessionRunner::new(
            Pacer::new(PacingMode::Realtime(stereo_8k())),
            EventDrainer::new(Vec::new()),
        );
        let summary = runner.run(source(3), session).await.unwrap();
        assert_eq!(summary.pacing.chunks_sent(), 3);
        assert_eq!(summary.drain.events, 1);
        assert_eq!(summary.drain.lines, 1);
        assert!(summary.wall_time >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_failure_cancels_drainer() {
        let (session, backend) = channel_session(8);
        let runner = SessionRunner::new(
            Pacer::new(PacingMode::Realtime(stereo_8k())),
            EventDrainer::new(Vec::new()),
        );

        match runner.run(Box::new(BrokenSource), session).await {
            Err(RunError::Pacing(PaceError::Source { index, .. })) => assert_eq!(index, 0),
            other => panic!("expected Pacing error, got {other:?}"),
        }
        // The drainer task dropped its receive half
        tokio::time::timeout(Duration::from_secs(1), backend.events.closed())
            .await
            .expect("drainer was not cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_draining_failure_cancels_pacer() {
        let (session, mut backend) = channel_session(8);
        backend
            .events
            .send(Err(SessionError::ReceiveFailed("stream reset".to_string())))
            .await
            .unwrap();

        let runner = SessionRunner::new(
            Pacer::new(PacingMode::Realtime(stereo_8k())),
            EventDrainer::new(Vec::new()),
        );
        match runner.run(source(100), session).await {
            Err(RunError::Draining(DrainError::Receive { .. })) => {}
            other => panic!("expected Draining error, got {other:?}"),
        }

        let mut received = 0;
        let mut ended = false;
        let limit = Duration::from_secs(1);
        while let Some(message) = tokio::time::timeout(limit, backend.inbound.recv())
            .await
            .expect("pacer was not cancelled")
        {
            match message {
                SinkMessage::Chunk(_) => received += 1,
                SinkMessage::EndOfInput => ended = true,
            }
        }
        assert!(received < 100);
        assert!(!ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_stuck_endpoint() {
        let (session, mut backend) = channel_session(8);
        // Consume input but never close the result stream
        let events = backend.events.clone();
        tokio::spawn(async move { while backend.inbound.recv().await.is_some() {} });

        let runner = SessionRunner::new(
            Pacer::new(PacingMode::Schedule(DelaySchedule::new(vec![100, 100]))),
            EventDrainer::new(Vec::new()),
        )
        .with_deadline(Duration::from_secs(5));

        match runner.run(source(2), session).await {
            Err(RunError::DeadlineExceeded(limit)) => assert_eq!(limit, Duration::from_secs(5)),
            other => panic!("expected DeadlineExceeded, got {other:?}"),
        }
        tokio::time::timeout(Duration::from_secs(1), events.closed())
            .await
            .expect("drainer was not aborted at the deadline");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_failure_still_shuts_down_handlers() {
        let (session, _backend) = channel_session(8);
        let (handler, shut_down) = FlagHandler::new(false);
        let runner = SessionRunner::new(
            Pacer::new(PacingMode::Realtime(stereo_8k())),
            EventDrainer::new(vec![Box::new(handler)]),
        );

        let err = runner.run(Box::new(BrokenSource), session).await.unwrap_err();
        assert!(matches!(err, RunError::Pacing(_)));
        assert!(shut_down.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_failure_fails_run_as_draining() {
        let (session, backend) = channel_session(8);
        backend.events.send(Ok(one_result_event())).await.unwrap();
        let (handler, shut_down) = FlagHandler::new(true);

        let runner = SessionRunner::new(
            Pacer::new(PacingMode::Realtime(stereo_8k())),
            EventDrainer::new(vec![Box::new(handler)]),
        );
        let err = runner.run(source(100), session).await.unwrap_err();

        match &err {
            RunError::Draining(DrainError::Handler { handler, source }) => {
                assert_eq!(handler, "flag");
                assert!(matches!(source, HandlerError::WriteFailed(_)));
            }
            other => panic!("expected Draining handler error, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.starts_with("draining failed"), "got: {message}");
        assert!(message.contains("flag"), "got: {message}");
        assert!(shut_down.load(Ordering::SeqCst));
    }
}
