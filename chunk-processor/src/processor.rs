use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use deid_common::AppError;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use futures::Future;
use phi_types::PHIEntity;

use crate::checkpoint::{checkpoint_path, file_signature, ProcessingCheckpoint};
use crate::chunking::{chunk_windows, estimate_total_chunks, ChunkInfo};
use crate::result::ChunkResult;

/// What a caller's processing closure returns for one chunk: the entities it
/// found plus bookkeeping the chunk processor doesn't know how to compute
/// itself (LLM timing, whether RAG context was fetched, ...).
#[derive(Clone, Debug, Default)]
pub struct ChunkOutcome {
    pub entities: Vec<PHIEntity>,
    pub processing_time_ms: f64,
    pub tool_calls_made: usize,
    pub rag_used: bool,
}

pub type ProcessFuture = Pin<Box<dyn Future<Output = Result<ChunkOutcome, AppError>> + Send>>;

/// The caller-supplied function that actually identifies PHI in a chunk
/// (running C2's tools, optionally consulting C3, then calling C4). The
/// chunk processor only owns windowing, ordering, and checkpointing.
pub type ProcessFn = Arc<dyn Fn(ChunkInfo, String) -> ProcessFuture + Send + Sync>;

/// Splits a document into overlapping byte windows and drives a caller
/// function over each one, FIFO, with periodic checkpointing and resume.
#[derive(Clone, Debug)]
pub struct StreamingChunkProcessor {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub checkpoint_dir: Option<PathBuf>,
    pub checkpoint_interval: usize,
    pub max_concurrency: usize,
}

impl StreamingChunkProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            checkpoint_dir: None,
            checkpoint_interval: 10,
            max_concurrency: 1,
        }
    }

    pub fn with_checkpointing(mut self, dir: impl Into<PathBuf>, interval: usize) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self.checkpoint_interval = interval.max(1);
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Process in-memory text under a stable `text_id`, used to key its
    /// checkpoint file. Chunks are emitted in FIFO order even when
    /// `max_concurrency > 1` lets several run concurrently underneath.
    pub fn process_text(
        &self,
        text: String,
        text_id: String,
        resume: bool,
        process_fn: ProcessFn,
    ) -> impl Stream<Item = ChunkResult> {
        run_stream(self.clone(), text.into_bytes(), text_id, resume, process_fn)
    }

    pub fn process_file(
        &self,
        path: PathBuf,
        resume: bool,
        process_fn: ProcessFn,
    ) -> impl Stream<Item = ChunkResult> {
        let config = self.clone();
        stream! {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to read input file");
                    yield ChunkResult::failed(0, 0, 0, format!("failed to read {}: {e}", path.display()));
                    return;
                }
            };
            let text_id = path.to_string_lossy().into_owned();
            let inner = run_stream(config, bytes, text_id, resume, process_fn);
            futures::pin_mut!(inner);
            while let Some(result) = inner.next().await {
                yield result;
            }
        }
    }
}

fn run_stream(
    config: StreamingChunkProcessor,
    bytes: Vec<u8>,
    input_id: String,
    resume: bool,
    process_fn: ProcessFn,
) -> impl Stream<Item = ChunkResult> {
    stream! {
        let total_size = bytes.len();
        let hash = file_signature(&bytes);
        let total_chunks = estimate_total_chunks(total_size, config.chunk_size, config.chunk_overlap);
        let cp_path = config.checkpoint_dir.as_ref().map(|dir| checkpoint_path(dir, &input_id));

        let mut checkpoint = load_or_init_checkpoint(
            cp_path.as_deref(),
            resume,
            &input_id,
            &hash,
            total_size,
            total_chunks,
            config.chunk_size,
            config.chunk_overlap,
        );

        let windows = chunk_windows(&bytes, config.chunk_size, config.chunk_overlap, 0);
        let pending: Vec<(Vec<u8>, ChunkInfo)> = windows
            .into_iter()
            .filter(|(_, info)| !checkpoint.processed_chunks.contains(&info.chunk_id))
            .collect();
        let expected_order: Vec<usize> = pending.iter().map(|(_, info)| info.chunk_id).collect();

        let semaphore = Arc::new(tokio::sync::Semaphore::new(config.max_concurrency));
        let mut in_flight = FuturesUnordered::new();
        let mut pending_iter = pending.into_iter();
        let mut reorder: BTreeMap<usize, ChunkResult> = BTreeMap::new();
        let mut emit_cursor = 0usize;
        let mut since_checkpoint = 0usize;

        loop {
            while in_flight.len() < config.max_concurrency {
                let Some((content, info)) = pending_iter.next() else { break };
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let func = process_fn.clone();
                let chunk_text = String::from_utf8_lossy(&content).into_owned();
                in_flight.push(async move {
                    let _permit = permit;
                    let outcome = func(info.clone(), chunk_text).await;
                    (info, outcome)
                });
            }

            let Some((info, outcome)) = in_flight.next().await else { break };

            let result = match outcome {
                Ok(ok) => {
                    checkpoint.record_chunk(info.chunk_id);
                    ChunkResult {
                        chunk_id: info.chunk_id,
                        start_pos: info.start_pos,
                        end_pos: info.end_pos,
                        entities: ok.entities,
                        raw_text: None,
                        success: true,
                        error: None,
                        processing_time_ms: ok.processing_time_ms,
                        tool_calls_made: ok.tool_calls_made,
                        rag_used: ok.rag_used,
                    }
                }
                Err(e) => {
                    tracing::warn!(chunk_id = info.chunk_id, error = %e, "chunk processing failed");
                    ChunkResult::failed(info.chunk_id, info.start_pos, info.end_pos, e.to_string())
                }
            };

            reorder.insert(result.chunk_id, result);
            since_checkpoint += 1;

            while emit_cursor < expected_order.len() {
                let expected_id = expected_order[emit_cursor];
                let Some(next) = reorder.remove(&expected_id) else { break };
                yield next;
                emit_cursor += 1;
            }

            if since_checkpoint >= config.checkpoint_interval {
                since_checkpoint = 0;
                if let Some(path) = &cp_path {
                    if let Err(e) = checkpoint.save(path) {
                        tracing::warn!(error = %e, "failed to save checkpoint");
                    }
                }
            }
        }

        for id in &expected_order[emit_cursor..] {
            if let Some(next) = reorder.remove(id) {
                yield next;
            }
        }

        if let Some(path) = &cp_path {
            if let Err(e) = checkpoint.save(path) {
                tracing::warn!(error = %e, "failed to save final checkpoint");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn load_or_init_checkpoint(
    cp_path: Option<&Path>,
    resume: bool,
    input_id: &str,
    hash: &str,
    total_size: usize,
    total_chunks: usize,
    chunk_size: usize,
    chunk_overlap: usize,
) -> ProcessingCheckpoint {
    let fresh = || ProcessingCheckpoint::new(input_id, hash, total_size, total_chunks, chunk_size, chunk_overlap);

    if !resume {
        return fresh();
    }
    let Some(path) = cp_path else { return fresh() };

    match ProcessingCheckpoint::load(path) {
        Ok(Some(existing)) if existing.matches(hash, chunk_size, chunk_overlap) => existing,
        Ok(Some(_)) => {
            tracing::info!(input = input_id, "checkpoint stale, restarting from scratch");
            fresh()
        }
        Ok(None) => fresh(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load checkpoint, starting fresh");
            fresh()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::StreamExt;

    fn noop_process_fn() -> ProcessFn {
        Arc::new(|_info: ChunkInfo, _text: String| {
            Box::pin(async { Ok(ChunkOutcome::default()) }) as ProcessFuture
        })
    }

    #[tokio::test]
    async fn emits_chunks_in_order_under_concurrency() {
        let processor = StreamingChunkProcessor::new(20, 5).with_concurrency(4);
        let text = "0123456789".repeat(10);
        let results: Vec<ChunkResult> = processor
            .process_text(text, "doc-1".to_string(), false, noop_process_fn())
            .collect()
            .await;

        let ids: Vec<usize> = results.iter().map(|r| r.chunk_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert!(results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn resume_skips_already_processed_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let processor = StreamingChunkProcessor::new(20, 5).with_checkpointing(dir.path(), 1);
        let text = "0123456789".repeat(10);

        let first_pass: Vec<ChunkResult> = processor
            .process_text(text.clone(), "doc-2".to_string(), true, noop_process_fn())
            .take(2)
            .collect()
            .await;
        assert_eq!(first_pass.len(), 2);

        let path = checkpoint_path(dir.path(), "doc-2");
        let checkpoint = ProcessingCheckpoint::load(&path).unwrap().unwrap();
        assert!(checkpoint.processed_chunks.contains(&0));

        let resumed: Vec<ChunkResult> = processor
            .process_text(text, "doc-2".to_string(), true, noop_process_fn())
            .collect()
            .await;
        assert!(!resumed.iter().any(|r| r.chunk_id == 0));
    }

    #[tokio::test]
    async fn failed_chunk_is_reported_not_fatal() {
        let failing: ProcessFn = Arc::new(|info: ChunkInfo, _text: String| {
            Box::pin(async move {
                if info.chunk_id == 1 {
                    Err(AppError::Internal("boom".to_string()))
                } else {
                    Ok(ChunkOutcome::default())
                }
            }) as ProcessFuture
        });

        let processor = StreamingChunkProcessor::new(20, 5);
        let text = "0123456789".repeat(10);
        let results: Vec<ChunkResult> = processor
            .process_text(text, "doc-3".to_string(), false, failing)
            .collect()
            .await;

        let failed: Vec<&ChunkResult> = results.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].chunk_id, 1);
        assert!(results.len() > 1);
    }
}
