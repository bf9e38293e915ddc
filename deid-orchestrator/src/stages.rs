use std::path::PathBuf;
use std::sync::Arc;

use chunk_processor::{ChunkInfo, ChunkOutcome, ProcessFn, ProcessFuture, StreamingChunkProcessor};
use deid_common::AppError;
use futures::StreamExt;
use masking_engine::{MaskingEngine, MaskingEngineConfig};
use phi_identifier::{identify_chunk, run_tools, StructuredLlmClient};
use phi_retrieval::{render_context, RegulationRetriever};
use phi_tools::Tool;
use phi_types::{PHIEntity, TypeRegistry};
use state_machines::core::GuardError;
use tracing::{debug, info, warn};

use crate::context::FileContext;
use crate::loader::DocumentLoader;
use crate::state::{FileMachine, Loaded, Masked, Merged, Ready, Streamed};

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::Internal(format!("invalid file pipeline transition during {event}: {guard:?}"))
}

/// Everything the stages need that's shared across an entire run, not
/// specific to one file.
pub struct StageDeps {
    pub loader: Arc<dyn DocumentLoader>,
    pub registry: Arc<TypeRegistry>,
    pub llm_client: Arc<dyn StructuredLlmClient>,
    pub retriever: Arc<dyn RegulationRetriever>,
    pub tools: Arc<Vec<Arc<dyn Tool>>>,
    pub masking_config: MaskingEngineConfig,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub checkpoint_dir: Option<PathBuf>,
    pub checkpoint_interval: usize,
    pub max_concurrency: usize,
    pub enable_rag: bool,
    pub enable_tools: bool,
    pub context_sample_chars: usize,
}

pub async fn load(
    machine: FileMachine<(), Ready>,
    ctx: &mut FileContext,
    deps: &StageDeps,
) -> Result<FileMachine<(), Loaded>, AppError> {
    let text = deps.loader.load(&ctx.path).await?;
    debug!(file = %ctx.file_id, chars = text.chars().count(), "file loaded");

    let rag_context = if deps.enable_rag {
        let sample: String = text.chars().take(deps.context_sample_chars).collect();
        match deps.retriever.retrieve_by_context(&sample, 5).await {
            Ok(docs) => Some(render_context(&docs)),
            Err(e) => {
                warn!(file = %ctx.file_id, error = %e, "regulation retrieval failed, falling back to minimal context");
                Some(phi_retrieval::minimal_context())
            }
        }
    } else {
        None
    };

    ctx.text = Some(text);
    ctx.rag_context = rag_context;

    machine.load().map_err(|(_, guard)| map_guard_error("load", &guard))
}

pub async fn stream(
    machine: FileMachine<(), Loaded>,
    ctx: &mut FileContext,
    deps: &StageDeps,
) -> Result<FileMachine<(), Streamed>, AppError> {
    let text = ctx.text()?.to_string();
    let context = ctx.rag_context.clone().unwrap_or_else(phi_retrieval::minimal_context);
    let rag_used = deps.enable_rag;

    let registry = Arc::clone(&deps.registry);
    let llm_client = Arc::clone(&deps.llm_client);
    let tools = Arc::clone(&deps.tools);
    let enable_tools = deps.enable_tools;

    let process_fn: ProcessFn = Arc::new(move |info: ChunkInfo, chunk_text: String| {
        let registry = Arc::clone(&registry);
        let llm_client = Arc::clone(&llm_client);
        let tools = Arc::clone(&tools);
        let context = context.clone();
        Box::pin(async move {
            let hints = if enable_tools { run_tools(&tools, &chunk_text) } else { Vec::new() };
            let outcome = identify_chunk(
                registry.as_ref(),
                llm_client.as_ref(),
                &context,
                rag_used,
                &hints,
                &chunk_text,
                info.start_pos,
            )
            .await?;
            Ok(ChunkOutcome {
                entities: outcome.entities,
                processing_time_ms: outcome.processing_time_ms,
                tool_calls_made: outcome.tool_calls_made,
                rag_used: outcome.rag_used,
            })
        }) as ProcessFuture
    });

    let mut processor =
        StreamingChunkProcessor::new(deps.chunk_size, deps.chunk_overlap).with_concurrency(deps.max_concurrency);
    if let Some(dir) = &deps.checkpoint_dir {
        processor = processor.with_checkpointing(dir.clone(), deps.checkpoint_interval);
    }

    let total_chars = text.chars().count();
    let result_stream = processor.process_text(text, ctx.file_id.clone(), ctx.resume, process_fn);
    futures::pin_mut!(result_stream);

    while let Some(result) = result_stream.next().await {
        let elapsed = result.processing_time_ms / 1000.0;
        ctx.progress.record_chunk(result.end_pos.saturating_sub(result.start_pos), elapsed);
        if !result.success {
            warn!(file = %ctx.file_id, chunk_id = result.chunk_id, error = ?result.error, "chunk failed");
        }
        ctx.chunk_results.push(result);
    }
    debug!(file = %ctx.file_id, total_chars, chunks = ctx.chunk_results.len(), "streaming complete");

    machine.stream().map_err(|(_, guard)| map_guard_error("stream", &guard))
}

pub fn merge(
    machine: FileMachine<(), Streamed>,
    ctx: &mut FileContext,
) -> Result<FileMachine<(), Merged>, AppError> {
    let mut entities: Vec<PHIEntity> = ctx.chunk_results.iter().flat_map(|r| r.entities.clone()).collect();

    entities.sort_by_key(|e| (e.start_pos, e.end_pos));
    entities.dedup_by(|a, b| {
        a.phi_type == b.phi_type && a.text == b.text && a.start_pos == b.start_pos && a.end_pos == b.end_pos
    });

    info!(file = %ctx.file_id, entity_count = entities.len(), "entities merged");
    ctx.entities = Some(entities);

    machine.merge().map_err(|(_, guard)| map_guard_error("merge", &guard))
}

pub fn mask(
    machine: FileMachine<(), Merged>,
    ctx: &mut FileContext,
    deps: &StageDeps,
) -> Result<FileMachine<(), Masked>, AppError> {
    let text = ctx.text()?.to_string();
    let entities = ctx.take_entities()?;

    let mut engine = MaskingEngine::new(deps.masking_config.clone());
    let report = engine.mask_document(&text, &entities);

    if !report.leaked_originals.is_empty() {
        warn!(
            file = %ctx.file_id,
            leaked = report.leaked_originals.len(),
            "masked output still contains some original entity text"
        );
    }

    ctx.entities = Some(entities);
    ctx.masking_report = Some(report);

    machine.mask().map_err(|(_, guard)| map_guard_error("mask", &guard))
}

pub async fn persist(
    machine: FileMachine<(), Masked>,
    ctx: &mut FileContext,
    output_paths: &deid_common::OutputPathManager,
) -> Result<FileMachine<(), crate::state::Persisted>, AppError> {
    let report = ctx.take_masking_report()?;
    let entities = ctx.entities.clone().unwrap_or_default();

    let now = chrono::Local::now();
    let output_path = output_paths.masked_output_path(&ctx.path, now);
    tokio::fs::write(&output_path, &report.masked_text).await?;

    let report_path = output_path.with_extension("report.json");
    deid_common::io::write_json_atomic(
        &report_path,
        &serde_json::json!({
            "file": ctx.file_id,
            "entity_count": entities.len(),
            "entities": entities,
            "leaked_originals": report.leaked_originals,
        }),
    )?;

    debug!(file = %ctx.file_id, output = %output_path.display(), "masked output persisted");
    ctx.masking_report = Some(report);

    machine.persist().map_err(|(_, guard)| map_guard_error("persist", &guard))
}
