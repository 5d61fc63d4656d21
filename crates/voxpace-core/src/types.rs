use std::time::Duration;

/// One bounded unit of audio bytes, sent to the endpoint as a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Chunk {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

/// Raw PCM layout, used to turn a byte count into the audio time it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub bytes_per_sample: u16,
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub fn bytes_per_second(&self) -> u64 {
        u64::from(self.bytes_per_sample) * u64::from(self.sample_rate_hz) * u64::from(self.channels)
    }

    /// Seconds of audio carried by `len` bytes.
    pub fn duration_secs(&self, len: usize) -> f64 {
        len as f64 / self.bytes_per_second() as f64
    }
}

/// Parameters the streaming endpoint needs to interpret the audio.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParams {
    pub language_code: String,
    pub sample_rate_hz: u32,
    pub bytes_per_sample: u16,
    pub media_encoding: String,
    pub channels: u16,
    pub enable_channel_identification: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    pub result_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub is_partial: bool,
    pub channel_id: Option<String>,
    pub alternatives: Vec<Alternative>,
}

/// One batch of results emitted by the endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptEvent {
    pub results: Vec<TranscriptResult>,
}

/// A single alternative flattened together with its result metadata, as
/// handed to result handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    /// Wall-clock time since the session started.
    pub elapsed: Duration,
    pub result_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub is_partial: bool,
    pub text: String,
}

impl TranscriptLine {
    pub fn new(elapsed: Duration, result: &TranscriptResult, alternative: &Alternative) -> Self {
        Self {
            elapsed,
            result_id: result.result_id.clone(),
            start_time: result.start_time,
            end_time: result.end_time,
            is_partial: result.is_partial,
            text: alternative.transcript.clone(),
        }
    }

    /// Elapsed seconds rounded to milliseconds.
    pub fn elapsed_secs(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 1000.0).round() / 1000.0
    }
}
