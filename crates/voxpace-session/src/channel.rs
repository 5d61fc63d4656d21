use crate::session_trait::{ChunkSink, ResultStream, Session};
use async_trait::async_trait;
use tokio::sync::mpsc;
use voxpace_core::{Chunk, SessionError, TranscriptEvent};

/// What the endpoint side of an in-memory session receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkMessage {
    Chunk(Chunk),
    EndOfInput,
}

/// Endpoint side of an in-memory session.
///
/// Dropping `events` closes the client's result stream.
pub struct SessionBackend {
    pub inbound: mpsc::Receiver<SinkMessage>,
    pub events: mpsc::Sender<Result<TranscriptEvent, SessionError>>,
}

struct ChannelSink {
    tx: mpsc::Sender<SinkMessage>,
    closed: bool,
}

#[async_trait]
impl ChunkSink for ChannelSink {
    async fn send_chunk(&mut self, chunk: Chunk) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::InputClosed);
        }
        self.tx
            .send(SinkMessage::Chunk(chunk))
            .await
            .map_err(|_| SessionError::SendFailed("endpoint closed the session".to_string()))
    }

    async fn end_of_input(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::InputClosed);
        }
        self.closed = true;
        self.tx
            .send(SinkMessage::EndOfInput)
            .await
            .map_err(|_| SessionError::SendFailed("endpoint closed the session".to_string()))
    }
}

struct ChannelResultStream {
    rx: mpsc::Receiver<Result<TranscriptEvent, SessionError>>,
}

#[async_trait]
impl ResultStream for ChannelResultStream {
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>, SessionError> {
        self.rx.recv().await.transpose()
    }
}

/// Create an in-memory session and the endpoint side that serves it.
pub fn channel_session(capacity: usize) -> (Session, SessionBackend) {
    let (chunk_tx, chunk_rx) = mpsc::channel(capacity.max(1));
    let (event_tx, event_rx) = mpsc::channel(capacity.max(1));

    let session = Session::new(
        Box::new(ChannelSink {
            tx: chunk_tx,
            closed: false,
        }),
        Box::new(ChannelResultStream { rx: event_rx }),
    );
    let backend = SessionBackend {
        inbound: chunk_rx,
        events: event_tx,
    };
    (session, backend)
}
