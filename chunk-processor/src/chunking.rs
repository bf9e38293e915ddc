use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One window of a document. Positions and `size` are byte offsets, not
/// character counts — chunk boundaries are computed over the document's
/// UTF-8 byte stream, consistent with how the deterministic tools in
/// `phi-tools` report spans.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub chunk_id: usize,
    pub start_pos: usize,
    pub end_pos: usize,
    pub size: usize,
    pub content_hash: String,
}

/// First 8 hex chars of the chunk's SHA-256 digest, used to verify a
/// resumed chunk's content hasn't silently changed.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// Split `bytes` into fixed-size, overlapping windows starting at
/// `start_chunk`. Step = `chunk_size - chunk_overlap`. Each window is
/// clamped to the document length; the final window may be shorter than
/// `chunk_size`.
pub fn chunk_windows(
    bytes: &[u8],
    chunk_size: usize,
    chunk_overlap: usize,
    start_chunk: usize,
) -> Vec<(Vec<u8>, ChunkInfo)> {
    let total = bytes.len();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut windows = Vec::new();

    let mut position = start_chunk.saturating_mul(step);
    let mut chunk_id = start_chunk;

    while position < total {
        let start = position;
        let end = (start + chunk_size).min(total);
        let content = bytes[start..end].to_vec();
        if content.is_empty() {
            break;
        }
        let info = ChunkInfo {
            chunk_id,
            start_pos: start,
            end_pos: end,
            size: content.len(),
            content_hash: content_hash(&content),
        };
        windows.push((content, info));

        position = start + step;
        chunk_id += 1;
    }

    windows
}

/// Total chunk count a document of `total_size` bytes will produce, used
/// to seed a fresh checkpoint before any chunk has actually been read.
pub fn estimate_total_chunks(total_size: usize, chunk_size: usize, chunk_overlap: usize) -> usize {
    if total_size == 0 {
        return 0;
    }
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    total_size.div_ceil(step).max(1)
}
