use crate::source_trait::ChunkSource;
use async_trait::async_trait;
use std::collections::VecDeque;
use voxpace_core::Chunk;

/// Serves pre-built chunks from memory.
pub struct MemoryChunkSource {
    chunks: VecDeque<Chunk>,
}

impl MemoryChunkSource {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    /// Split `bytes` into `chunk_size` pieces; the last piece may be shorter.
    pub fn from_bytes(bytes: &[u8], chunk_size: usize) -> Self {
        let chunks = bytes
            .chunks(chunk_size.max(1))
            .map(Chunk::from)
            .collect();
        Self { chunks }
    }

    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait]
impl ChunkSource for MemoryChunkSource {
    async fn next_chunk(&mut self) -> std::io::Result<Option<Chunk>> {
        Ok(self.chunks.pop_front())
    }
}
