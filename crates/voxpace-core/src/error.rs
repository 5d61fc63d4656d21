use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures at the session boundary, in either direction.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session initialization failed: {0}")]
    InitializationFailed(String),

    #[error("streaming client not found: {0}")]
    ClientNotFound(String),

    #[error("failed to send chunk: {0}")]
    SendFailed(String),

    #[error("failed to receive results: {0}")]
    ReceiveFailed(String),

    #[error("session input already closed")]
    InputClosed,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler initialization failed: {0}")]
    InitializationFailed(String),

    #[error("failed to write result: {0}")]
    WriteFailed(String),

    #[error("handler not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum PaceError {
    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("failed to read chunk {index} from source: {source}")]
    Source {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("delay schedule exhausted at chunk {index} (schedule has {len} entries)")]
    ScheduleExhausted { index: usize, len: usize },

    #[error("failed to send chunk {index}: {source}")]
    Send {
        index: usize,
        #[source]
        source: SessionError,
    },

    #[error("failed to signal end of input: {0}")]
    EndOfInput(#[source] SessionError),
}

#[derive(Debug, Error)]
pub enum DrainError {
    #[error("event stream failed after {events} event(s): {source}")]
    Receive {
        events: usize,
        #[source]
        source: SessionError,
    },

    #[error("handler '{handler}' failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },
}

/// Overall outcome of a paced session, naming the stage that failed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("pacing failed: {0}")]
    Pacing(#[from] PaceError),

    #[error("draining failed: {0}")]
    Draining(#[from] DrainError),

    #[error("{stage} task did not complete: {message}")]
    TaskAborted { stage: &'static str, message: String },

    #[error("session deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}
