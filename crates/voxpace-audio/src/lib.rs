pub mod file_source;
pub mod memory_source;
pub mod source_trait;

pub use file_source::FileChunkSource;
pub use memory_source::MemoryChunkSource;
pub use source_trait::ChunkSource;
