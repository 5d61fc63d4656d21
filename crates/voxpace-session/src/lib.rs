pub mod channel;
pub mod loopback_client;
pub mod registry;
pub mod session_trait;

pub use channel::{channel_session, SessionBackend, SinkMessage};
pub use loopback_client::LoopbackClient;
pub use registry::ClientRegistry;
pub use session_trait::{ChunkSink, ResultStream, Session, StreamingClient};
