use phi_types::PHIEntity;
use serde::{Deserialize, Serialize};

/// Outcome of processing a single chunk, whatever the caller's `process_func`
/// does with it. A failed chunk carries its error message rather than
/// aborting the stream — the chunk processor reports per-chunk failures and
/// keeps going, leaving retry policy to the orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunk_id: usize,
    pub start_pos: usize,
    pub end_pos: usize,
    pub entities: Vec<PHIEntity>,
    pub raw_text: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub processing_time_ms: f64,
    pub tool_calls_made: usize,
    pub rag_used: bool,
}

impl ChunkResult {
    pub fn failed(chunk_id: usize, start_pos: usize, end_pos: usize, error: impl Into<String>) -> Self {
        Self {
            chunk_id,
            start_pos,
            end_pos,
            entities: Vec::new(),
            raw_text: None,
            success: false,
            error: Some(error.into()),
            processing_time_ms: 0.0,
            tool_calls_made: 0,
            rag_used: false,
        }
    }
}
