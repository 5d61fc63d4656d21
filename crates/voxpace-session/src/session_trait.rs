use async_trait::async_trait;
use voxpace_core::{Chunk, SessionError, StreamParams, TranscriptEvent};

/// Outbound half of a session.
#[async_trait]
pub trait ChunkSink: Send {
    async fn send_chunk(&mut self, chunk: Chunk) -> Result<(), SessionError>;
    /// Tell the endpoint no more audio will follow.
    async fn end_of_input(&mut self) -> Result<(), SessionError>;
}

/// Inbound half of a session.
#[async_trait]
pub trait ResultStream: Send {
    /// Next result batch, or `Ok(None)` once the endpoint has closed the stream.
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>, SessionError>;
}

/// A bidirectional streaming session, split into independently owned halves.
pub struct Session {
    pub input: Box<dyn ChunkSink>,
    pub output: Box<dyn ResultStream>,
}

impl Session {
    pub fn new(input: Box<dyn ChunkSink>, output: Box<dyn ResultStream>) -> Self {
        Self { input, output }
    }

    pub fn into_split(self) -> (Box<dyn ChunkSink>, Box<dyn ResultStream>) {
        (self.input, self.output)
    }
}

/// A client able to open streaming sessions against some endpoint.
///
/// Implementations are registered via [`ClientRegistry`](crate::ClientRegistry).
/// Authentication, encoding negotiation and wire framing live entirely
/// behind this trait.
#[async_trait]
pub trait StreamingClient: Send + Sync {
    /// Returns the client's plugin name (e.g. `"loopback"`).
    fn name(&self) -> &str;
    /// One-time initialisation with client-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), SessionError>;
    /// Open a new session for audio described by `params`.
    async fn start_stream(&self, params: &StreamParams) -> Result<Session, SessionError>;
}
