use async_trait::async_trait;
use voxpace_core::Chunk;

/// A finite, ordered sequence of audio chunks.
///
/// Each call yields the next chunk, `Ok(None)` once the source is exhausted,
/// or the I/O error that stopped it. Sources are opened fresh for every run.
#[async_trait]
pub trait ChunkSource: Send {
    async fn next_chunk(&mut self) -> std::io::Result<Option<Chunk>>;
}
