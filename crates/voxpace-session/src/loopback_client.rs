use crate::channel::{channel_session, SessionBackend, SinkMessage};
use crate::session_trait::{Session, StreamingClient};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use voxpace_core::{
    Alternative, AudioFormat, SessionError, StreamParams, TranscriptEvent, TranscriptResult,
};

const DEFAULT_PARTIAL_EVERY: usize = 10;
const CHANNEL_CAPACITY: usize = 64;

/// An in-process endpoint that "recognizes" byte counts.
///
/// Every `partial_every` chunks it emits a partial result describing the audio
/// received so far; after end of input it emits one final result and closes
/// the result stream.
pub struct LoopbackClient {
    partial_every: usize,
    sessions_started: AtomicUsize,
}

impl LoopbackClient {
    pub fn new() -> Self {
        Self {
            partial_every: DEFAULT_PARTIAL_EVERY,
            sessions_started: AtomicUsize::new(0),
        }
    }

    pub fn partial_every(&self) -> usize {
        self.partial_every
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::Relaxed)
    }
}

impl Default for LoopbackClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamingClient for LoopbackClient {
    fn name(&self) -> &str {
        "loopback"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), SessionError> {
        if let Some(value) = config.get("partial_every") {
            let n = value
                .as_integer()
                .filter(|n| *n >= 1)
                .ok_or_else(|| {
                    SessionError::InitializationFailed(
                        "'partial_every' must be a positive integer".to_string(),
                    )
                })?;
            self.partial_every = n as usize;
        }
        Ok(())
    }

    async fn start_stream(&self, params: &StreamParams) -> Result<Session, SessionError> {
        if params.media_encoding != "pcm" {
            return Err(SessionError::InitializationFailed(format!(
                "unsupported media encoding: {}",
                params.media_encoding
            )));
        }
        if params.sample_rate_hz == 0 || params.channels == 0 || params.bytes_per_sample == 0 {
            return Err(SessionError::InitializationFailed(
                "sample rate, bytes per sample and channel count must be non-zero".to_string(),
            ));
        }

        let session_no = self.sessions_started.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            session = session_no,
            language_code = %params.language_code,
            sample_rate_hz = params.sample_rate_hz,
            bytes_per_sample = params.bytes_per_sample,
            channels = params.channels,
            enable_channel_identification = params.enable_channel_identification,
            "loopback stream started"
        );

        let (session, backend) = channel_session(CHANNEL_CAPACITY);
        let endpoint = LoopbackEndpoint {
            format: AudioFormat {
                bytes_per_sample: params.bytes_per_sample,
                sample_rate_hz: params.sample_rate_hz,
                channels: params.channels,
            },
            channel_id: params
                .enable_channel_identification
                .then(|| "ch_0".to_string()),
            partial_every: self.partial_every,
            result_id: format!("loopback-{session_no}"),
        };
        tokio::spawn(endpoint.serve(backend));
        Ok(session)
    }
}

struct LoopbackEndpoint {
    format: AudioFormat,
    channel_id: Option<String>,
    partial_every: usize,
    result_id: String,
}

impl LoopbackEndpoint {
    fn result(&self, bytes: usize, is_partial: bool) -> TranscriptEvent {
        TranscriptEvent {
            results: vec![TranscriptResult {
                result_id: self.result_id.clone(),
                start_time: 0.0,
                end_time: self.format.duration_secs(bytes),
                is_partial,
                channel_id: self.channel_id.clone(),
                alternatives: vec![Alternative {
                    transcript: format!("[loopback] {bytes} bytes"),
                }],
            }],
        }
    }

    async fn serve(self, mut backend: SessionBackend) {
        let mut chunks = 0usize;
        let mut bytes = 0usize;

        while let Some(message) = backend.inbound.recv().await {
            match message {
                SinkMessage::Chunk(chunk) => {
                    chunks += 1;
                    bytes += chunk.len();
                    if chunks % self.partial_every == 0
                        && backend.events.send(Ok(self.result(bytes, true))).await.is_err()
                    {
                        tracing::debug!(result_id = %self.result_id, "result receiver dropped");
                        return;
                    }
                }
                SinkMessage::EndOfInput => {
                    if chunks > 0
                        && backend.events.send(Ok(self.result(bytes, false))).await.is_err()
                    {
                        tracing::debug!(result_id = %self.result_id, "result receiver dropped");
                        return;
                    }
                    tracing::debug!(
                        result_id = %self.result_id,
                        chunks,
                        bytes,
                        "loopback stream finished"
                    );
                    return;
                }
            }
        }

        // Input half dropped without end of input
        tracing::debug!(result_id = %self.result_id, "sink dropped before end of input");
    }
}
