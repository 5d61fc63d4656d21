use crate::handler_trait::ResultHandler;
use tokio::time::Instant;
use voxpace_core::{DrainError, TranscriptLine};
use voxpace_session::ResultStream;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub events: usize,
    pub results: usize,
    pub lines: usize,
}

/// Pulls result batches until the stream closes and hands every alternative
/// to each handler, in order.
pub struct EventDrainer {
    handlers: Vec<Box<dyn ResultHandler>>,
    session_start: Instant,
}

impl EventDrainer {
    pub fn new(handlers: Vec<Box<dyn ResultHandler>>) -> Self {
        Self {
            handlers,
            session_start: Instant::now(),
        }
    }

    /// Measure elapsed time from `start` instead of from construction.
    pub fn with_session_start(mut self, start: Instant) -> Self {
        self.session_start = start;
        self
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Drain `stream` until it closes.
    ///
    /// Errors from the stream or any handler end the drain immediately;
    /// lines already handled stay handled.
    pub async fn drain(&self, stream: &mut dyn ResultStream) -> Result<DrainReport, DrainError> {
        let mut report = DrainReport::default();

        loop {
            let event = match stream.next_event().await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(source) => {
                    return Err(DrainError::Receive {
                        events: report.events,
                        source,
                    })
                }
            };
            report.events += 1;

            // One timestamp per batch
            let elapsed = self.session_start.elapsed();
            for result in &event.results {
                report.results += 1;
                for alternative in &result.alternatives {
                    let line = TranscriptLine::new(elapsed, result, alternative);
                    for handler in &self.handlers {
                        handler
                            .handle(&line)
                            .await
                            .map_err(|source| DrainError::Handler {
                                handler: handler.name().to_string(),
                                source,
                            })?;
                    }
                    report.lines += 1;
                }
            }
        }

        tracing::info!(
            events = report.events,
            results = report.results,
            lines = report.lines,
            "result stream closed"
        );
        Ok(report)
    }

    /// Shut down every handler, logging failures.
    pub async fn shutdown(&self) {
        for handler in &self.handlers {
            if let Err(e) = handler.shutdown().await {
                tracing::error!(handler = %handler.name(), "handler shutdown failed: {e}");
            }
        }
    }
}
