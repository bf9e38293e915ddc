pub mod checkpoint;
pub mod chunking;
pub mod processor;
pub mod result;

pub use checkpoint::{checkpoint_path, file_signature, ProcessingCheckpoint};
pub use chunking::{chunk_windows, content_hash, estimate_total_chunks, ChunkInfo};
pub use processor::{ChunkOutcome, ProcessFn, ProcessFuture, StreamingChunkProcessor};
pub use result::ChunkResult;
