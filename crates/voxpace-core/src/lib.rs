pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{ConfigError, DrainError, HandlerError, PaceError, RunError, SessionError};
pub use types::{
    Alternative, AudioFormat, Chunk, StreamParams, TranscriptEvent, TranscriptLine,
    TranscriptResult,
};
