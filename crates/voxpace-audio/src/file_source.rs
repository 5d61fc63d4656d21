use crate::source_trait::ChunkSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use voxpace_core::Chunk;

/// Reads a file in fixed-size chunks. Only the final chunk may be shorter.
pub struct FileChunkSource {
    path: PathBuf,
    file: File,
    chunk_size: usize,
    chunks_read: usize,
    exhausted: bool,
}

impl FileChunkSource {
    pub async fn open(path: &Path, chunk_size: usize) -> std::io::Result<Self> {
        if chunk_size == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "chunk size must be greater than zero",
            ));
        }
        let file = File::open(path).await?;
        tracing::debug!(path = %path.display(), chunk_size, "opened audio source");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            chunk_size,
            chunks_read: 0,
            exhausted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chunks_read(&self) -> usize {
        self.chunks_read
    }
}

#[async_trait]
impl ChunkSource for FileChunkSource {
    async fn next_chunk(&mut self) -> std::io::Result<Option<Chunk>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < self.chunk_size {
            self.exhausted = true;
        }
        if filled == 0 {
            tracing::debug!(
                path = %self.path.display(),
                chunks = self.chunks_read,
                "audio source exhausted"
            );
            return Ok(None);
        }

        buf.truncate(filled);
        self.chunks_read += 1;
        Ok(Some(Chunk::new(buf)))
    }
}
